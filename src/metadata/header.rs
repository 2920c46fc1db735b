//! Parsing and rewriting of the `# Key: value` header block.

use crate::types::MetadataRecord;

const REQUIRED_KEYS: [&str; 3] = ["brand", "device_type", "model"];

/// Accumulates header fields until all required ones are present. A record is
/// valid iff brand, device type and model are all set; no partial record ever
/// leaves this module.
#[derive(Default)]
struct HeaderBuilder {
    brand: Option<String>,
    device_type: Option<String>,
    model: Option<String>,
    protocol: Option<String>,
}

impl HeaderBuilder {
    /// First occurrence wins; later duplicates are ignored.
    fn record(&mut self, key: &str, value: &str) {
        let slot = match key {
            "brand" => &mut self.brand,
            "device_type" => &mut self.device_type,
            "model" => &mut self.model,
            "protocol" => &mut self.protocol,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    fn is_complete(&self) -> bool {
        self.brand.is_some() && self.device_type.is_some() && self.model.is_some()
    }

    fn build(self) -> Option<MetadataRecord> {
        Some(MetadataRecord {
            brand: self.brand?,
            device_type: self.device_type?,
            model: self.model?,
            protocol: self.protocol,
            is_guessed: false,
        })
    }
}

/// Extract a metadata record from a file's leading comment lines.
///
/// A line qualifies only if, after trimming, it starts with `# `. The key is
/// the text before the first colon, lowercased with spaces replaced by
/// underscores; the value is the rest (re-joined on further colons), trimmed.
/// Scanning stops as soon as brand, device type and model have all been seen.
/// Returns `None` unless all three required keys were found.
pub fn parse_header(content: &str) -> Option<MetadataRecord> {
    let mut builder = HeaderBuilder::default();

    for line in content.lines() {
        if builder.is_complete() {
            break;
        }
        let line = line.trim();
        let Some(rest) = line.strip_prefix("# ") else { continue };
        let Some((raw_key, raw_value)) = rest.split_once(':') else { continue };
        let key = raw_key.to_lowercase().replace(' ', "_");
        builder.record(&key, raw_value.trim());
    }

    if builder.is_complete() {
        builder.build()
    } else {
        None
    }
}

/// Insert the three metadata comment lines into `content`, immediately after
/// the first line starting with `Version:`, or at the top if there is none.
/// This is the write-back format of the confirmation workflow; a subsequent
/// [`parse_header`] yields the same record with `is_guessed` false.
pub fn insert_header(content: &str, metadata: &MetadataRecord) -> String {
    let block = format!(
        "# Brand: {}\n# Model: {}\n# Device Type: {}",
        metadata.brand, metadata.model, metadata.device_type
    );

    let mut lines: Vec<&str> = content.split('\n').collect();
    let insert_at = lines
        .iter()
        .position(|l| l.starts_with("Version:"))
        .map(|i| i + 1)
        .unwrap_or(0);
    lines.insert(insert_at, &block);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "Filetype: IR signals file\n\
                        Version: 1\n\
                        # Brand: Samsung\n\
                        # Device Type: TV\n\
                        # Model: UE55NU7100\n\
                        name: POWER\n";

    #[test]
    fn parses_complete_header() {
        let m = parse_header(FULL).unwrap();
        assert_eq!(m.brand, "Samsung");
        assert_eq!(m.device_type, "TV");
        assert_eq!(m.model, "UE55NU7100");
        assert!(!m.is_guessed);
        assert!(m.protocol.is_none());
    }

    #[test]
    fn captures_protocol_when_present() {
        let content = "# Protocol: NECext\n# Brand: LG\n# Device Type: TV\n# Model: AKB72915\n";
        let m = parse_header(content).unwrap();
        assert_eq!(m.protocol.as_deref(), Some("NECext"));
    }

    #[test]
    fn missing_any_required_key_yields_none() {
        assert!(parse_header("# Brand: Sony\n# Model: RM839\n").is_none());
        assert!(parse_header("# Brand: Sony\n# Device Type: TV\n").is_none());
        assert!(parse_header("").is_none());
        assert!(parse_header("Filetype: IR signals file\n").is_none());
    }

    #[test]
    fn first_occurrence_wins() {
        let content = "# Brand: Sony\n# Device Type: TV\n# Model: RM839\n# Brand: Samsung\n";
        let m = parse_header(content).unwrap();
        assert_eq!(m.brand, "Sony");
    }

    #[test]
    fn keys_are_case_normalized_and_values_keep_colons() {
        let content = "# BRAND: Sony\n# DEVICE TYPE: TV\n# Model: RM:839\n";
        let m = parse_header(content).unwrap();
        assert_eq!(m.brand, "Sony");
        assert_eq!(m.device_type, "TV");
        assert_eq!(m.model, "RM:839");
    }

    #[test]
    fn marker_requires_space_after_hash() {
        assert!(parse_header("#Brand: Sony\n#Device Type: TV\n#Model: RM839\n").is_none());
    }

    #[test]
    fn indented_comment_lines_still_qualify() {
        let content = "   # Brand: Sony\n\t# Device Type: TV\n # Model: RM839\n";
        assert!(parse_header(content).is_some());
    }

    #[test]
    fn insert_goes_after_version_line() {
        let content = "Filetype: IR signals file\nVersion: 1\nname: POWER\n";
        let meta = MetadataRecord {
            brand: "SONY".into(),
            model: "RM839".into(),
            device_type: "TV".into(),
            protocol: None,
            is_guessed: true,
        };
        let out = insert_header(content, &meta);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines[1], "Version: 1");
        assert_eq!(lines[2], "# Brand: SONY");
        assert_eq!(lines[3], "# Model: RM839");
        assert_eq!(lines[4], "# Device Type: TV");
        assert_eq!(lines[5], "name: POWER");
    }

    #[test]
    fn insert_falls_back_to_top_without_version_line() {
        let meta = MetadataRecord {
            brand: "SONY".into(),
            model: "RM839".into(),
            device_type: "TV".into(),
            protocol: None,
            is_guessed: true,
        };
        let out = insert_header("name: POWER\n", &meta);
        assert!(out.starts_with("# Brand: SONY\n"));
    }

    #[test]
    fn write_back_round_trips_through_the_parser() {
        let guessed = MetadataRecord {
            brand: "SAMSUNG".into(),
            model: "UE55NU7100".into(),
            device_type: "TV".into(),
            protocol: None,
            is_guessed: true,
        };
        let rewritten = insert_header("Filetype: IR signals file\nVersion: 1\n", &guessed);
        let parsed = parse_header(&rewritten).unwrap();
        assert_eq!(parsed.brand, guessed.brand);
        assert_eq!(parsed.model, guessed.model);
        assert_eq!(parsed.device_type, guessed.device_type);
        assert!(!parsed.is_guessed);
    }
}
