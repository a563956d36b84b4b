use crate::error::{Error, Result};

const OBJECT_ID_HEX_LEN: usize = 24;

/// Returns whether `id` is acceptable where the catalog expects an object id.
///
/// The empty string is accepted and means "no constraint". Anything else must
/// be the 24-hex-digit rendering of a 12-byte object id.
pub fn is_valid_object_id(id: &str) -> bool {
    id.is_empty() || (id.len() == OBJECT_ID_HEX_LEN && id.bytes().all(|b| b.is_ascii_hexdigit()))
}

pub(crate) fn validate_object_id(id: &str) -> Result<()> {
    if is_valid_object_id(id) {
        Ok(())
    } else {
        Err(Error::new(format!("{} is not a valid ObjectId!", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_means_no_filter() {
        assert!(is_valid_object_id(""));
        assert!(validate_object_id("").is_ok());
    }

    #[test]
    fn accepts_hex_of_either_case() {
        assert!(is_valid_object_id("5d9e26ada81660b57e387f49"));
        assert!(is_valid_object_id("5D9E26ADA81660B57E387F49"));
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "not_an_ID",
            "5d9e26ada81660b57e387f4",
            "5d9e26ada81660b57e387f490",
            "5d9e26ada81660b57e387f4g",
            "abcdefghijkl",
            " 5d9e26ada81660b57e387f4",
        ] {
            assert!(!is_valid_object_id(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn error_names_the_input() {
        let err = validate_object_id("not_an_ID").unwrap_err();
        assert_eq!(err.to_string(), "not_an_ID is not a valid ObjectId!");
    }
}
