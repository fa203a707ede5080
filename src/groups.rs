//! Release-group and fansub-group recognition.
//!
//! Group names are matched against a built-in table of known patterns,
//! anchored to the punctuation that conventionally surrounds a group tag:
//! a `-`, `@` or opening bracket on the left and a separator, dot or
//! bracket on the right. Matching is case-insensitive and runs over the
//! original, un-normalized title.

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use tracing::warn;

use crate::config::EngineConfig;

/// Known group name patterns. Each entry is a regex alternative; the
/// boundary lookarounds are added when the table is compiled.
static GROUP_PATTERNS: &[&str] = &[
    // PT site in-house groups.
    "FF(?:(?:A|WE)B|CD|E(?:DU|B)|TV)",
    "Audies",
    "AD(?:Audio|E(?:|book)|Music|Web)",
    "BeiTai",
    "Bts(?:CHOOL|HD|PAD|TV)",
    "Zone",
    "CarPT",
    "CHD(?:|Bits|PAD|(?:|HK)TV|WEB)",
    "StBOX",
    "OneHD",
    "Lee",
    "xiaopie",
    "(?:(?:iNT|(?:HALFC|Mini(?:S|H|FH)D))-|)TLF",
    "(?:DG|GBWE)B",
    "Hares(?:|(?:M|T)V|Web)",
    "HDA(?:pad|rea|TV)",
    "EPiC",
    "HDC(?:|hina|TV)",
    "k9611",
    "tudou",
    "iHD",
    "D(?:ream|BTV)",
    "(?:HD|QHstudI)o",
    "beAst(?:|TV)",
    "HDH(?:|ome|Pad|TV|WEB)",
    "HDPT(?:|Web)",
    "HDS(?:|ky|TV|Pad|WEB)",
    "AQLJ",
    "HDZ(?:|one)",
    "HHWEB",
    "HTPT",
    "FRDS",
    "Yumi",
    "cXcY",
    "L(?:eague(?:(?:C|H)D|(?:M|T)V|NF)|WEB)",
    "i18n",
    "CiNT",
    "MTeam(?:|TV)",
    "MPAD",
    "Our(?:Bits|TV)",
    "FLTTH",
    "Ao",
    "PbK",
    "MGs",
    "iLove(?:HD|TV)",
    "PiGo(?:NF|(?:H|WE)B)",
    "PTer(?:|DIY|Game|(?:M|T)V|WEB)",
    "PTH(?:|Audio|eBook|music|ome|tv|WEB)",
    "PTsbao",
    "OPS",
    "F(?:Fans(?:AIeNcE|BD|D(?:VD|IY)|TV|WEB)|HDMv)",
    "SGXT",
    "PuTao",
    "CMCT(?:|V)",
    "TJUPT",
    "TTG",
    "WiKi",
    "NGB",
    "DoA",
    "(?:ARi|ExRE)N",
    // Scene and P2P groups.
    "B(?:MDru|eyondHD|TN)",
    "C(?:fandora|trlhd|MRG)",
    "DON",
    "EVO",
    "FLUX",
    "HONE(?:|yG)",
    "N(?:oGroup|T(?:b|G))",
    "PandaMoon",
    "SMURF",
    "T(?:EPES|aengoo|rollHD )",
    // Fansub groups.
    "ANi",
    "HYSUB",
    "KTXP",
    "LoliHouse",
    "MCE",
    "Nekomoe kissaten",
    "(?:Lilith|NC)-Raws",
    "织梦字幕组",
];

fn boundary_wrap(alternatives: &str) -> String {
    format!(r"(?i)(?<=[-@\[【&])(?:{alternatives})(?=[@.\s\]\[】&])")
}

static GROUP_RE: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(&boundary_wrap(&GROUP_PATTERNS.join("|"))).unwrap()
});

/// All group names found in `title`, deduplicated in discovery order.
///
/// `custom` extends the built-in table with extra alternatives for this
/// call; a malformed custom pattern falls back to the built-in table.
pub fn match_groups(title: &str, custom: Option<&str>) -> Vec<String> {
    let compiled;
    let re = match custom.filter(|extra| !extra.is_empty()) {
        Some(extra) => {
            let pattern = boundary_wrap(&format!("{}|{extra}", GROUP_PATTERNS.join("|")));
            match FancyRegex::new(&pattern) {
                Ok(re) => {
                    compiled = re;
                    &compiled
                }
                Err(err) => {
                    warn!(error = %err, "ignoring malformed custom group patterns");
                    &*GROUP_RE
                }
            }
        }
        None => &*GROUP_RE,
    };

    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(title).flatten() {
        let text = m.as_str().to_owned();
        if !found.contains(&text) {
            found.push(text);
        }
    }
    found
}

/// Matched groups joined with the configured separator, `None` when the
/// title names no known group.
pub fn match_groups_joined(title: &str, config: &EngineConfig) -> Option<String> {
    let found = match_groups(title, config.custom_groups.as_deref());
    if found.is_empty() {
        None
    } else {
        Some(found.join(config.separator()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_group_after_dash() {
        let found = match_groups("The.Matrix.1999.1080p.BluRay.x264-CHD.mkv", None);
        assert_eq!(found, vec!["CHD"]);
    }

    #[test]
    fn test_prefixed_variant_matches_whole_tag() {
        let found = match_groups("Movie.2019.720p.HDTV.x264-iNT-TLF.mkv", None);
        assert_eq!(found, vec!["iNT-TLF"]);
    }

    #[test]
    fn test_bracketed_fansub_group() {
        let found = match_groups("[LoliHouse] 某动画 - 12 [WebRip 1080p]", None);
        assert_eq!(found, vec!["LoliHouse"]);
    }

    #[test]
    fn test_case_insensitive_but_text_preserved() {
        let found = match_groups("Show.S01.2160p.WEB-DL-frds.mkv", None);
        assert_eq!(found, vec!["frds"]);
    }

    #[test]
    fn test_multiple_groups_discovery_order_deduplicated() {
        let found = match_groups("[ANi] 某动画 - 05 [1080p][CHT]-ANi.mp4", None);
        assert_eq!(found, vec!["ANi"]);
    }

    #[test]
    fn test_no_boundary_no_match() {
        // Group names embedded in a word are not tags.
        assert!(match_groups("WikiLeaks.Documentary.2013.720p", None).is_empty());
        assert!(match_groups("plain title with no groups", None).is_empty());
    }

    #[test]
    fn test_custom_patterns_extend_table() {
        let found = match_groups("Show.S01E01-MyGrp.mkv", Some("MyGrp|OtherGrp"));
        assert_eq!(found, vec!["MyGrp"]);
    }

    #[test]
    fn test_malformed_custom_patterns_fall_back() {
        let found = match_groups("Movie.1080p-FRDS.mkv", Some("([unclosed"));
        assert_eq!(found, vec!["FRDS"]);
    }

    #[test]
    fn test_joined_with_separator() {
        let config = EngineConfig::builder().group_separator("/").build();
        let joined = match_groups_joined("[ANi] x -TLF.mkv", &config);
        assert_eq!(joined.as_deref(), Some("ANi/TLF"));
    }
}
