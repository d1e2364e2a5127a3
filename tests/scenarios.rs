mod common;

use std::collections::HashMap;

use serde_json::json;

use common::{create_elastic_processor, StubClient};
use elastic_indexer::{
    chain::{
        AlteredAccount, AlteredAccountExtra, AlteredTokenData, Body, ChainTokenMetaData, Event,
        Header, MetaHeader, MiniBlock, MiniBlockType, Pool, SaveBlockData, Scr, ShardHeader,
        Transaction, TxInfo, TxLog,
    },
    process::elastic::ElasticProcessorHandler,
};

const TIMESTAMP: u64 = 5040;

fn shard_header(shard_id: u32) -> Header {
    Header::Shard(ShardHeader {
        shard_id,
        round: 50,
        timestamp: TIMESTAMP,
        ..Default::default()
    })
}

fn nft_transfer_data(len: usize) -> Vec<u8> {
    let prefix = b"ESDTNFTTransfer@".to_vec();
    let mut data = prefix;
    data.resize(len, b'a');
    data
}

fn save_block_args(
    header: Header,
    body: Body,
    pool: Pool,
    altered: HashMap<String, AlteredAccount>,
) -> SaveBlockData {
    SaveBlockData {
        header_hash: b"headerhash".to_vec(),
        header,
        body,
        transaction_pool: pool,
        altered_accounts: altered,
        number_of_shards: 2,
        ..Default::default()
    }
}

/// Cross-shard NFT transfer with an SC call: the source block charges the
/// whole gas limit while the transfer is pending on the other shard.
#[tokio::test]
async fn nft_transfer_cross_shard_with_sc_call_at_source() {
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    let tx_hash = b"nftTransferWithSCCall".to_vec();
    let tx_hash_hex = hex::encode(&tx_hash);
    let scr_hash = b"scrHash2".to_vec();
    let sender = vec![0, 0, 2]; // shard 0

    let body = Body {
        miniblocks: vec![
            MiniBlock {
                mb_type: MiniBlockType::TxBlock,
                sender_shard_id: 0,
                receiver_shard_id: 0,
                tx_hashes: vec![tx_hash.clone()],
                ..Default::default()
            },
            MiniBlock {
                mb_type: MiniBlockType::SmartContractResultBlock,
                sender_shard_id: 0,
                receiver_shard_id: 1,
                tx_hashes: vec![scr_hash.clone()],
                ..Default::default()
            },
        ],
    };

    let mut pool = Pool::default();
    pool.txs.insert(
        tx_hash_hex.clone(),
        TxInfo::new(Transaction {
            nonce: 79,
            sender: sender.clone(),
            receiver: sender.clone(),
            gas_limit: 150_000_000,
            gas_price: 1_000_000_000,
            data: nft_transfer_data(239),
            value: "0".to_string(),
            ..Default::default()
        }),
    );
    pool.scrs.insert(
        hex::encode(&scr_hash),
        TxInfo::new(Scr {
            nonce: 0,
            gas_price: 1_000_000_000,
            gas_limit: 148_957_500,
            sender: sender.clone(),
            receiver: vec![0, 0, 3], // shard 1
            data: nft_transfer_data(64),
            prev_tx_hash: tx_hash.clone(),
            original_tx_hash: tx_hash.clone(),
            ..Default::default()
        }),
    );

    let args = save_block_args(shard_header(0), body, pool, HashMap::new());
    processor.save_transactions(&args).await.unwrap();

    let doc = client
        .payload_after_meta(&format!(r#""_id" : "{tx_hash_hex}""#))
        .expect("transaction document");
    assert_eq!(doc["status"], "success");
    assert_eq!(doc["gasUsed"], 150_000_000);
    assert_eq!(doc["fee"], "1904415000000000");
    assert_eq!(doc["hasScResults"], true);

    // the SCR lands in its own index as a plain insert
    let scr_doc = client
        .payload_after_meta(&format!(
            r#""_index":"scresults", "_id" : "{}""#,
            hex::encode(&scr_hash)
        ))
        .expect("scr document");
    assert_eq!(scr_doc["originalTxHash"], tx_hash_hex);
    assert_eq!(scr_doc["senderShard"], 0);
    assert_eq!(scr_doc["receiverShard"], 1);
}

/// A refund SCR arriving in a later block finds its transaction in the
/// store and rewrites gas-used and fee in place.
#[tokio::test]
async fn refund_in_later_block_corrects_gas_and_fee() {
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    let tx_hash_hex = hex::encode(b"nftTransferWithSCCall");
    let sender = vec![0, 0, 2];
    let sender_hex = hex::encode(&sender);
    let data_b64 = {
        use base64::{engine::general_purpose::STANDARD, Engine};
        STANDARD.encode(nft_transfer_data(239))
    };

    // the already-indexed transaction, as the store would return it
    client.set_multi_get_response(
        "transactions",
        json!({
            "docs": [{
                "_id": tx_hash_hex,
                "found": true,
                "_source": {
                    "sender": sender_hex,
                    "gasLimit": 150_000_000u64,
                    "gasPrice": 1_000_000_000u64,
                    "data": data_b64
                }
            }]
        }),
    );

    let refund_hash = b"scrWithRefund".to_vec();
    let body = Body {
        miniblocks: vec![MiniBlock {
            mb_type: MiniBlockType::SmartContractResultBlock,
            sender_shard_id: 0,
            receiver_shard_id: 0,
            tx_hashes: vec![refund_hash.clone()],
            ..Default::default()
        }],
    };

    let mut pool = Pool::default();
    pool.scrs.insert(
        hex::encode(&refund_hash),
        TxInfo::new(Scr {
            nonce: 80,
            value: "101676480000000".to_string(),
            sender: vec![0, 0, 4],
            receiver: sender,
            data: b"@6f6b@017d15".to_vec(),
            original_tx_hash: b"nftTransferWithSCCall".to_vec(),
            ..Default::default()
        }),
    );

    let args = save_block_args(shard_header(0), body, pool, HashMap::new());
    processor.save_transactions(&args).await.unwrap();

    let content = client.all_bulk_content();
    assert!(content.contains(r#""gasUsed":139832352"#));
    assert!(content.contains(r#""fee":"1802738520000000""#));

    // the correction goes to both the transactions and operations indexes
    let metas = client.meta_lines_containing(&format!(r#""_id" : "{tx_hash_hex}""#));
    assert!(metas.iter().any(|meta| meta.contains(r#""_index":"transactions""#)));
    assert!(metas.iter().any(|meta| meta.contains(r#""_index":"operations""#)));
}

/// Destination sees a failed cross-shard transfer before the source block
/// arrives: a minimal status-only document is upserted.
#[tokio::test]
async fn destination_before_source_upserts_status_only() {
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    let original_hash_hex = hex::encode(b"nftTransferCross");
    let scr_hash = b"scrWithError".to_vec();

    let mut error_data = b"ESDTNFTTransfer@434f4c@01@".to_vec();
    error_data.extend_from_slice(hex::encode("user error").as_bytes());

    let body = Body {
        miniblocks: vec![MiniBlock {
            mb_type: MiniBlockType::SmartContractResultBlock,
            sender_shard_id: 0,
            receiver_shard_id: 1,
            tx_hashes: vec![scr_hash.clone()],
            ..Default::default()
        }],
    };

    let mut pool = Pool::default();
    pool.scrs.insert(
        hex::encode(&scr_hash),
        TxInfo::new(Scr {
            sender: vec![0, 0, 2],
            receiver: vec![0, 0, 3],
            data: error_data,
            original_tx_hash: b"nftTransferCross".to_vec(),
            ..Default::default()
        }),
    );

    let args = save_block_args(shard_header(1), body, pool, HashMap::new());
    processor.save_transactions(&args).await.unwrap();

    let patch = client
        .payload_after_meta(&format!(r#""_id" : "{original_hash_hex}""#))
        .expect("status patch");
    assert_eq!(patch["script"]["params"]["status"], "fail");
    assert_eq!(patch["upsert"]["status"], "fail");
    // the upsert is the minimal zero-valued document
    assert_eq!(patch["upsert"]["nonce"], 0);
    assert!(patch["upsert"].get("hasScResults").is_none());
}

/// NFT create followed by a transfer that zeroes the sender: the sender's
/// accounts-ESDT row is deleted, the receiver's row appears.
#[tokio::test]
async fn accounts_esdt_balance_follows_nft_transfer() {
    let owner = hex::encode("test-address-balance-1");
    let receiver = hex::encode("new-address");

    // create: the owner holds the NFT
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    let mut altered = HashMap::new();
    altered.insert(
        owner.clone(),
        AlteredAccount {
            address: owner.clone(),
            balance: "1000".to_string(),
            additional: AlteredAccountExtra {
                is_sender: false,
                balance_changed: true,
            },
            tokens: vec![AlteredTokenData {
                identifier: "NFT-abcdef".to_string(),
                nonce: 0x718863,
                balance: "1000".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
    );

    let args = save_block_args(shard_header(0), Body::default(), Pool::default(), altered);
    processor.save_transactions(&args).await.unwrap();

    let key = format!("{owner}-NFT-abcdef-718863");
    let row = client
        .payload_after_meta(&format!(r#""_index":"accountsesdt", "_id" : "{key}""#))
        .expect("owner token row");
    assert_eq!(row["balance"], "1000");
    assert_eq!(row["identifier"], "NFT-abcdef-718863");

    // transfer: the owner is zeroed, the receiver holds the NFT
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    let mut altered = HashMap::new();
    altered.insert(
        owner.clone(),
        AlteredAccount {
            address: owner.clone(),
            balance: "1000".to_string(),
            additional: AlteredAccountExtra {
                is_sender: true,
                balance_changed: true,
            },
            tokens: vec![AlteredTokenData {
                identifier: "NFT-abcdef".to_string(),
                nonce: 0x718863,
                balance: "0".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    altered.insert(
        receiver.clone(),
        AlteredAccount {
            address: receiver.clone(),
            balance: "0".to_string(),
            additional: AlteredAccountExtra {
                is_sender: false,
                balance_changed: false,
            },
            tokens: vec![AlteredTokenData {
                identifier: "NFT-abcdef".to_string(),
                nonce: 0x718863,
                balance: "1000".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
    );

    let args = save_block_args(shard_header(0), Body::default(), Pool::default(), altered);
    processor.save_transactions(&args).await.unwrap();

    let content = client.all_bulk_content();
    assert!(content.contains(&format!(
        r#""delete" : {{ "_index":"accountsesdt", "_id" : "{owner}-NFT-abcdef-718863" }}"#
    )));
    let receiver_row = client
        .payload_after_meta(&format!(
            r#""_index":"accountsesdt", "_id" : "{receiver}-NFT-abcdef-718863""#
        ))
        .expect("receiver token row");
    assert_eq!(receiver_row["balance"], "1000");
}

/// Rolling back a block removes its accounts-ESDT rows and their history
/// by (shard, timestamp).
#[tokio::test]
async fn accounts_esdt_rollback_removes_by_shard_and_timestamp() {
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    processor.remove_accounts_esdt(TIMESTAMP, 2).await.unwrap();

    let removals = client.removals.lock().unwrap();
    assert_eq!(removals.len(), 2);
    assert_eq!(removals[0].0, "accountsesdt");
    assert_eq!(removals[1].0, "accountsesdthistory");

    for (_, query) in removals.iter() {
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must[0]["match"]["shardID"]["query"], 2);
        assert_eq!(must[1]["match"]["timestamp"]["query"], TIMESTAMP);
    }
}

/// Token issue followed by role grants, the create-role transfer pair and
/// a revocation, all reflected on the tokens index.
#[tokio::test]
async fn issue_token_and_manage_roles() {
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    let tx_hash_hex = hex::encode(b"issueTx");
    let address1 = vec![1u8, 1, 1];
    let address2 = vec![2u8, 2, 2];

    let events = vec![
        Event {
            address: vec![9, 9, 9],
            identifier: b"issueSemiFungible".to_vec(),
            topics: vec![b"TOK-abcd".to_vec(), b"semi".to_vec(), b"TOK".to_vec()],
            ..Default::default()
        },
        Event {
            address: address1.clone(),
            identifier: b"ESDTSetRole".to_vec(),
            topics: vec![
                b"TOK-abcd".to_vec(),
                vec![],
                vec![],
                b"ESDTRoleNFTCreate".to_vec(),
                b"ESDTRoleNFTBurn".to_vec(),
            ],
            ..Default::default()
        },
        Event {
            address: address1.clone(),
            identifier: b"ESDTNFTCreateRoleTransfer".to_vec(),
            topics: vec![b"TOK-abcd".to_vec(), vec![], vec![], vec![0]],
            ..Default::default()
        },
        Event {
            address: address2.clone(),
            identifier: b"ESDTNFTCreateRoleTransfer".to_vec(),
            topics: vec![b"TOK-abcd".to_vec(), vec![], vec![], vec![1]],
            ..Default::default()
        },
        Event {
            address: address1.clone(),
            identifier: b"ESDTUnSetRole".to_vec(),
            topics: vec![
                b"TOK-abcd".to_vec(),
                vec![],
                vec![],
                b"ESDTRoleNFTBurn".to_vec(),
            ],
            ..Default::default()
        },
    ];

    let mut pool = Pool::default();
    pool.logs.insert(
        tx_hash_hex,
        TxLog {
            address: vec![9, 9, 9],
            events,
        },
    );

    let header = Header::Meta(MetaHeader {
        timestamp: TIMESTAMP,
        ..Default::default()
    });
    let args = save_block_args(header, Body::default(), pool, HashMap::new());
    processor.save_transactions(&args).await.unwrap();

    let token_doc = client
        .payload_after_meta(r#""_index":"tokens", "_id" : "TOK-abcd""#)
        .expect("issued token document");
    assert_eq!(token_doc["type"], "SemiFungibleESDT");
    assert_eq!(token_doc["issuer"], "090909");

    let content = client.all_bulk_content();
    // grants for both roles, the unset/set transfer pair, and the revoke
    assert_eq!(content.matches("roles.put(params.role, new ArrayList())").count(), 3);
    assert_eq!(content.matches("removeIf").count(), 2);
    assert!(content.contains(r#""address":"010101""#));
    assert!(content.contains(r#""address":"020202""#));
}

/// NFT metadata updates apply in event order: URIs deduplicate in the
/// script, a later opaque attributes update leaves earlier tags alone.
#[tokio::test]
async fn nft_attribute_updates_apply_in_order() {
    let client = StubClient::new();
    let processor = create_elastic_processor(client.clone()).await;

    let tx_hash_hex = hex::encode(b"updateTx");
    let metadata = ChainTokenMetaData {
        name: b"nft".to_vec(),
        creator: vec![0, 0, 2],
        uris: vec![b"uri".to_vec(), b"uri".to_vec()],
        ..Default::default()
    };
    let marshalled_metadata = serde_json::to_vec(&metadata).unwrap();

    let mut events = vec![Event {
        address: vec![0, 0, 2], // shard 0 of 2
        identifier: b"ESDTNFTCreate".to_vec(),
        topics: vec![
            b"NFT-abcd".to_vec(),
            vec![0x0e],
            vec![0x01],
            marshalled_metadata,
        ],
        ..Default::default()
    }];
    let add_uri = Event {
        address: vec![0, 0, 2],
        identifier: b"ESDTNFTAddURI".to_vec(),
        topics: vec![
            b"NFT-abcd".to_vec(),
            vec![0x0e],
            b"uri1".to_vec(),
            b"uri2".to_vec(),
        ],
        ..Default::default()
    };
    events.push(add_uri.clone());
    events.push(add_uri);
    events.push(Event {
        address: vec![0, 0, 2],
        identifier: b"ESDTNFTUpdateAttributes".to_vec(),
        topics: vec![
            b"NFT-abcd".to_vec(),
            vec![0x0e],
            b"tags:test,free,fun;description:custom;metadata:metadata-test".to_vec(),
        ],
        ..Default::default()
    });
    events.push(Event {
        address: vec![0, 0, 2],
        identifier: b"ESDTNFTUpdateAttributes".to_vec(),
        topics: vec![b"NFT-abcd".to_vec(), vec![0x0e], b"something".to_vec()],
        ..Default::default()
    });

    let mut pool = Pool::default();
    pool.logs.insert(
        tx_hash_hex,
        TxLog {
            address: vec![0, 0, 2],
            events,
        },
    );

    let args = save_block_args(shard_header(0), Body::default(), pool, HashMap::new());
    processor.save_transactions(&args).await.unwrap();

    // the created document carries the original two URIs
    let created = client
        .payload_after_meta(r#""_index":"tokens", "_id" : "NFT-abcd-0e""#)
        .expect("created token document");
    assert_eq!(created["data"]["uris"].as_array().unwrap().len(), 2);

    let content = client.all_bulk_content();
    // the URI-append script deduplicates, so replays converge
    assert!(content.contains("if (!ctx._source.data.uris.contains(uri))"));
    // both attribute updates are present, in order
    let first_attrs = content.find(r#""metadata":"metadata-test""#).unwrap();
    let second_attrs = content.find(r#""attributes":"c29tZXRoaW5n""#).unwrap();
    assert!(first_attrs < second_attrs);
    // the opaque update carries no tags or metadata parameters
    let updates = client.meta_lines_containing("NFT-abcd-0e");
    assert!(updates.len() >= 3);
}
