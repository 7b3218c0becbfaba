// Splits election keys such as "東京都新宿区議会議員選挙" into a prefecture and a municipality.

const PREFECTURES: [&str; 47] = [
    "北海道",
    "青森県",
    "岩手県",
    "宮城県",
    "秋田県",
    "山形県",
    "福島県",
    "茨城県",
    "栃木県",
    "群馬県",
    "埼玉県",
    "千葉県",
    "東京都",
    "神奈川県",
    "新潟県",
    "富山県",
    "石川県",
    "福井県",
    "山梨県",
    "長野県",
    "岐阜県",
    "静岡県",
    "愛知県",
    "三重県",
    "滋賀県",
    "京都府",
    "大阪府",
    "兵庫県",
    "奈良県",
    "和歌山県",
    "鳥取県",
    "島根県",
    "岡山県",
    "広島県",
    "山口県",
    "徳島県",
    "香川県",
    "愛媛県",
    "高知県",
    "福岡県",
    "佐賀県",
    "長崎県",
    "熊本県",
    "大分県",
    "宮崎県",
    "鹿児島県",
    "沖縄県",
];

// Removed in this order, each at most once.
const TRAILING_PATTERNS: [&str; 11] = [
    "補欠",
    "再",
    "再選",
    "議会議員",
    "議員",
    "議会",
    "市長",
    "町長",
    "村長",
    "区長",
    "知事",
];

const ELECTION_MARKER: &str = "選挙";

#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct Locality {
    pub prefecture: String,
    pub municipality: String,
}

/// Removes all the whitespace, including the ideographic space.
pub fn remove_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Returns the (prefecture, municipality) pair an election key refers to, or None if the key
/// does not start with a prefecture or names no municipality.
pub fn split_municipality_key(key: &str) -> Option<Locality> {
    let mut name = remove_whitespace(key);
    if let Some(pos) = name.find(ELECTION_MARKER) {
        name.truncate(pos);
    }
    for suffix in TRAILING_PATTERNS {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
        }
    }
    let prefecture = PREFECTURES.iter().find(|p| name.starts_with(**p))?;
    let municipality = name[prefecture.len()..].trim();
    if municipality.is_empty() {
        return None;
    }
    Some(Locality {
        prefecture: prefecture.to_string(),
        municipality: municipality.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(p: &str, m: &str) -> Option<Locality> {
        Some(Locality {
            prefecture: p.to_string(),
            municipality: m.to_string(),
        })
    }

    #[test]
    fn assembly_and_mayor_keys() {
        assert_eq!(
            split_municipality_key("東京都新宿区議会議員選挙"),
            loc("東京都", "新宿区")
        );
        // Mayor keys lose their municipality suffix with the office name.
        assert_eq!(split_municipality_key("北海道札幌市長選挙"), loc("北海道", "札幌"));
        assert_eq!(
            split_municipality_key("神奈川県 横浜市議会議員補欠選挙"),
            loc("神奈川県", "横浜市")
        );
        assert_eq!(
            split_municipality_key("大阪府\u{3000}堺市議会議員選挙（西区）"),
            loc("大阪府", "堺市")
        );
    }

    #[test]
    fn unknown_or_empty_localities() {
        assert_eq!(split_municipality_key("衆議院議員総選挙"), None);
        assert_eq!(split_municipality_key("東京都知事選挙"), None);
        assert_eq!(split_municipality_key(""), None);
    }
}
