use crate::config::EconomicsConfig;

const MODIFIER_DENOMINATOR: u128 = 1_000_000_000_000_000;

/// Recomputes gas-used and fee values under the protocol's refund semantics.
/// The gas-price modifier is applied as an exact rational so that a fee
/// derived from a refund and the refund derived back from a fee agree.
pub struct FeesProcessor {
    min_gas_limit: u64,
    gas_per_data_byte: u64,
    modifier_numerator: u128,
}

impl FeesProcessor {
    pub fn new(economics: &EconomicsConfig) -> Self {
        FeesProcessor {
            min_gas_limit: economics.min_gas_limit,
            gas_per_data_byte: economics.gas_per_data_byte,
            modifier_numerator: (economics.gas_price_modifier * MODIFIER_DENOMINATOR as f64)
                .round() as u128,
        }
    }

    /// The gas a plain balance move with this data field costs; execution gas
    /// beyond it is charged at the modified price.
    pub fn compute_gas_limit(&self, data: &[u8]) -> u64 {
        self.min_gas_limit + self.gas_per_data_byte * data.len() as u64
    }

    pub fn compute_tx_fee_based_on_gas_used(
        &self,
        gas_price: u64,
        data: &[u8],
        gas_used: u64,
    ) -> u128 {
        let move_balance_gas = self.compute_gas_limit(data);
        let price = gas_price as u128;

        if gas_used <= move_balance_gas {
            return price * gas_used as u128;
        }

        let move_balance_fee = price * move_balance_gas as u128;
        let execution_gas = (gas_used - move_balance_gas) as u128;
        move_balance_fee + execution_gas * price * self.modifier_numerator / MODIFIER_DENOMINATOR
    }

    /// Inverts the fee formula: given the refund returned to the sender,
    /// yields the gas actually used and the final fee.
    pub fn compute_gas_used_and_fee_based_on_refund_value(
        &self,
        gas_limit: u64,
        gas_price: u64,
        data: &[u8],
        refund: u128,
    ) -> (u64, u128) {
        let full_fee = self.compute_tx_fee_based_on_gas_used(gas_price, data, gas_limit);
        if refund == 0 || refund >= full_fee {
            return (gas_limit, full_fee);
        }

        let tx_fee = full_fee - refund;
        let move_balance_gas = self.compute_gas_limit(data);
        let price = gas_price as u128;
        let move_balance_fee = price * move_balance_gas as u128;
        if tx_fee <= move_balance_fee {
            return ((tx_fee / price) as u64, tx_fee);
        }

        let execution_gas =
            (tx_fee - move_balance_fee) * MODIFIER_DENOMINATOR / (price * self.modifier_numerator);
        (move_balance_gas + execution_gas as u64, tx_fee)
    }
}
