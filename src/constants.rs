use std::time::Duration;

// index names; an alias with this name points at the rolling `<name>-000001` index
pub const TRANSACTIONS_INDEX: &str = "transactions";
pub const BLOCKS_INDEX: &str = "blocks";
pub const MINIBLOCKS_INDEX: &str = "miniblocks";
pub const RATING_INDEX: &str = "rating";
pub const ROUNDS_INDEX: &str = "rounds";
pub const VALIDATORS_INDEX: &str = "validators";
pub const ACCOUNTS_INDEX: &str = "accounts";
pub const ACCOUNTS_HISTORY_INDEX: &str = "accountshistory";
pub const RECEIPTS_INDEX: &str = "receipts";
pub const SCRESULTS_INDEX: &str = "scresults";
pub const ACCOUNTS_ESDT_INDEX: &str = "accountsesdt";
pub const ACCOUNTS_ESDT_HISTORY_INDEX: &str = "accountsesdthistory";
pub const EPOCH_INFO_INDEX: &str = "epochinfo";
pub const SC_DEPLOYS_INDEX: &str = "scdeploys";
pub const TOKENS_INDEX: &str = "tokens";
pub const TAGS_INDEX: &str = "tags";
pub const LOGS_INDEX: &str = "logs";
pub const DELEGATORS_INDEX: &str = "delegators";
pub const OPERATIONS_INDEX: &str = "operations";

pub const OPEN_DISTRO_TEMPLATE: &str = "opendistro";
pub const INDEX_SUFFIX: &str = "000001";

pub const ALL_INDICES: [&str; 19] = [
    TRANSACTIONS_INDEX,
    BLOCKS_INDEX,
    MINIBLOCKS_INDEX,
    RATING_INDEX,
    ROUNDS_INDEX,
    VALIDATORS_INDEX,
    ACCOUNTS_INDEX,
    ACCOUNTS_HISTORY_INDEX,
    RECEIPTS_INDEX,
    SCRESULTS_INDEX,
    ACCOUNTS_ESDT_INDEX,
    ACCOUNTS_ESDT_HISTORY_INDEX,
    EPOCH_INFO_INDEX,
    SC_DEPLOYS_INDEX,
    TOKENS_INDEX,
    TAGS_INDEX,
    LOGS_INDEX,
    DELEGATORS_INDEX,
    OPERATIONS_INDEX,
];

// shard identifiers
pub const METACHAIN_SHARD_ID: u32 = u32::MAX;
pub const ALL_SHARD_ID: u32 = u32::MAX - 1;

// transaction statuses
pub const TX_STATUS_SUCCESS: &str = "success";
pub const TX_STATUS_PENDING: &str = "pending";
pub const TX_STATUS_INVALID: &str = "invalid";
pub const TX_STATUS_FAIL: &str = "fail";

// built-in function and event identifiers
pub const ESDT_TRANSFER: &str = "ESDTTransfer";
pub const ESDT_NFT_TRANSFER: &str = "ESDTNFTTransfer";
pub const MULTI_ESDT_NFT_TRANSFER: &str = "MultiESDTNFTTransfer";
pub const ESDT_LOCAL_MINT: &str = "ESDTLocalMint";
pub const ESDT_LOCAL_BURN: &str = "ESDTLocalBurn";
pub const ESDT_NFT_CREATE: &str = "ESDTNFTCreate";
pub const ESDT_NFT_BURN: &str = "ESDTNFTBurn";
pub const ESDT_WIPE: &str = "ESDTWipe";
pub const ESDT_NFT_ADD_URI: &str = "ESDTNFTAddURI";
pub const ESDT_NFT_UPDATE_ATTRIBUTES: &str = "ESDTNFTUpdateAttributes";
pub const SC_DEPLOY_IDENTIFIER: &str = "SCDeploy";
pub const SC_UPGRADE_IDENTIFIER: &str = "SCUpgrade";
pub const WRITE_LOG_IDENTIFIER: &str = "writeLog";
pub const SIGNAL_ERROR_IDENTIFIER: &str = "signalError";

pub const ISSUE_FUNGIBLE_IDENTIFIER: &str = "issue";
pub const ISSUE_SEMI_FUNGIBLE_IDENTIFIER: &str = "issueSemiFungible";
pub const ISSUE_NON_FUNGIBLE_IDENTIFIER: &str = "issueNonFungible";
pub const REGISTER_META_ESDT_IDENTIFIER: &str = "registerMetaESDT";
pub const TRANSFER_OWNERSHIP_IDENTIFIER: &str = "transferOwnership";
pub const ESDT_SET_ROLE_IDENTIFIER: &str = "ESDTSetRole";
pub const ESDT_UNSET_ROLE_IDENTIFIER: &str = "ESDTUnSetRole";
pub const ESDT_NFT_CREATE_ROLE_TRANSFER_IDENTIFIER: &str = "ESDTNFTCreateRoleTransfer";
pub const ESDT_ROLE_NFT_CREATE: &str = "ESDTRoleNFTCreate";

pub const DELEGATE_IDENTIFIER: &str = "delegate";
pub const UNDELEGATE_IDENTIFIER: &str = "unDelegate";
pub const WITHDRAW_IDENTIFIER: &str = "withdraw";
pub const REDELEGATE_REWARDS_IDENTIFIER: &str = "reDelegateRewards";

// token types, as stored in the tokens index
pub const FUNGIBLE_ESDT: &str = "FungibleESDT";
pub const SEMI_FUNGIBLE_ESDT: &str = "SemiFungibleESDT";
pub const NON_FUNGIBLE_ESDT: &str = "NonFungibleESDT";
pub const META_ESDT: &str = "MetaESDT";

// data-field markers
pub const AT_SEPARATOR: &str = "@";
pub const OK_HEX_MARKER: &str = "@6f6b";
pub const OK_PLAIN_MARKER: &str = "@ok";
pub const RELAYED_TX_PREFIX: &str = "relayedTx@";
pub const RELAYED_TX_V2_PREFIX: &str = "relayedTxV2@";
pub const USER_ERROR_MESSAGE: &str = "user error";
pub const MIN_NUM_ARGUMENTS_NFT_TRANSFER: usize = 4;

// dispatcher retry policy
pub const BACK_OFF_TIME: Duration = Duration::from_millis(250);
pub const MAX_BACK_OFF_TIME: Duration = Duration::from_secs(10);
pub const DURATION_BETWEEN_ERROR_RETRY: Duration = Duration::from_secs(2);

// websocket stream
pub const WS_RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub const DEFAULT_BULK_REQUEST_MAX_SIZE: usize = 4 * 1024 * 1024;

// execution-order sentinels in the block miniblock details
pub const NOT_EXECUTED_IN_CURRENT_BLOCK: i32 = -1;
pub const NOT_FOUND_IN_POOL: i32 = -2;
