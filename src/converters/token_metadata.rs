use crate::{address::PubkeyConverter, chain::ChainTokenMetaData, data::account::TokenMetaData};

const IPFS_URL: &str = "https://ipfs.io/ipfs/";

const TAGS_KEY: &str = "tags";
const METADATA_KEY: &str = "metadata";
const ATTRIBUTES_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = ':';
const TAGS_SEPARATOR: char = ',';

/// Converts wire token metadata into the document shape, extracting the tags
/// and metadata entries packed inside the attributes field.
pub fn prepare_token_metadata(
    converter: &dyn PubkeyConverter,
    metadata: &ChainTokenMetaData,
) -> TokenMetaData {
    let creator = if metadata.creator.is_empty() {
        String::new()
    } else {
        converter.encode(&metadata.creator)
    };

    TokenMetaData {
        name: String::from_utf8_lossy(&metadata.name).into_owned(),
        creator,
        royalties: metadata.royalties,
        hash: metadata.hash.clone(),
        uris: metadata.uris.clone(),
        tags: extract_tags_from_attributes(&metadata.attributes),
        attributes: metadata.attributes.clone(),
        metadata: extract_metadata_from_attributes(&metadata.attributes),
        non_empty_uris: non_empty_uris(&metadata.uris),
        white_listed_storage: white_listed_storage(&metadata.uris),
    }
}

/// `tags:a,b,c` entry of an `;`-separated attributes field.
pub fn extract_tags_from_attributes(attributes: &[u8]) -> Vec<String> {
    attribute_value(attributes, TAGS_KEY)
        .map(|value| {
            value
                .split(TAGS_SEPARATOR)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `metadata:...` entry of an `;`-separated attributes field.
pub fn extract_metadata_from_attributes(attributes: &[u8]) -> String {
    attribute_value(attributes, METADATA_KEY).unwrap_or_default()
}

fn attribute_value(attributes: &[u8], key: &str) -> Option<String> {
    let attributes = std::str::from_utf8(attributes).ok()?;
    for entry in attributes.split(ATTRIBUTES_SEPARATOR) {
        let mut parts = entry.splitn(2, KEY_VALUE_SEPARATOR);
        if parts.next() == Some(key) {
            return parts.next().map(str::to_string);
        }
    }
    None
}

fn non_empty_uris(uris: &[Vec<u8>]) -> bool {
    uris.iter().any(|uri| !uri.is_empty())
}

fn white_listed_storage(uris: &[Vec<u8>]) -> bool {
    uris.first()
        .map(|uri| uri.starts_with(IPFS_URL.as_bytes()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::HexPubkeyConverter;

    #[test]
    fn extracts_tags_and_metadata() {
        let attributes = b"tags:test,free,fun;description:custom description;metadata:metadata-test";
        assert_eq!(
            extract_tags_from_attributes(attributes),
            vec!["test", "free", "fun"]
        );
        assert_eq!(extract_metadata_from_attributes(attributes), "metadata-test");
    }

    #[test]
    fn opaque_attributes_extract_nothing() {
        assert!(extract_tags_from_attributes(b"something").is_empty());
        assert_eq!(extract_metadata_from_attributes(b"something"), "");
    }

    #[test]
    fn metadata_flags_follow_uris() {
        let converter = HexPubkeyConverter::new(3, "");
        let metadata = ChainTokenMetaData {
            name: b"nft".to_vec(),
            creator: vec![1, 2, 3],
            royalties: 250,
            uris: vec![b"https://ipfs.io/ipfs/QmXiAxP".to_vec()],
            ..Default::default()
        };

        let prepared = prepare_token_metadata(&converter, &metadata);
        assert_eq!(prepared.name, "nft");
        assert_eq!(prepared.creator, "010203");
        assert!(prepared.non_empty_uris);
        assert!(prepared.white_listed_storage);
    }
}
