/*!
 * Japanese prefectures.
 *
 * Articles store their prefecture either as a canonical romanized code
 * (`"kyoto"`) or as the Japanese display name (`"京都府"`). Translated
 * articles use whichever form the configured policy asks for.
 */

use crate::app_config::PrefecturePolicy;

/// Canonical code and Japanese name of every prefecture, north to south
pub const PREFECTURES: [(&str, &str); 47] = [
    ("hokkaido", "北海道"),
    ("aomori", "青森県"),
    ("iwate", "岩手県"),
    ("miyagi", "宮城県"),
    ("akita", "秋田県"),
    ("yamagata", "山形県"),
    ("fukushima", "福島県"),
    ("ibaraki", "茨城県"),
    ("tochigi", "栃木県"),
    ("gunma", "群馬県"),
    ("saitama", "埼玉県"),
    ("chiba", "千葉県"),
    ("tokyo", "東京都"),
    ("kanagawa", "神奈川県"),
    ("niigata", "新潟県"),
    ("toyama", "富山県"),
    ("ishikawa", "石川県"),
    ("fukui", "福井県"),
    ("yamanashi", "山梨県"),
    ("nagano", "長野県"),
    ("gifu", "岐阜県"),
    ("shizuoka", "静岡県"),
    ("aichi", "愛知県"),
    ("mie", "三重県"),
    ("shiga", "滋賀県"),
    ("kyoto", "京都府"),
    ("osaka", "大阪府"),
    ("hyogo", "兵庫県"),
    ("nara", "奈良県"),
    ("wakayama", "和歌山県"),
    ("tottori", "鳥取県"),
    ("shimane", "島根県"),
    ("okayama", "岡山県"),
    ("hiroshima", "広島県"),
    ("yamaguchi", "山口県"),
    ("tokushima", "徳島県"),
    ("kagawa", "香川県"),
    ("ehime", "愛媛県"),
    ("kochi", "高知県"),
    ("fukuoka", "福岡県"),
    ("saga", "佐賀県"),
    ("nagasaki", "長崎県"),
    ("kumamoto", "熊本県"),
    ("oita", "大分県"),
    ("miyazaki", "宮崎県"),
    ("kagoshima", "鹿児島県"),
    ("okinawa", "沖縄県"),
];

/// Japanese name for a canonical code
pub fn japanese_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    PREFECTURES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Canonical code for a code or Japanese name.
///
/// The name may omit its 都/道/府/県 suffix.
pub fn canonical_code(value: &str) -> Option<&'static str> {
    let value = value.trim();
    PREFECTURES
        .iter()
        .find(|(code, name)| {
            code.eq_ignore_ascii_case(value) || *name == value || strip_suffix(name) == value
        })
        .map(|(code, _)| *code)
}

fn strip_suffix(name: &str) -> &str {
    // 北海道 keeps its full name
    if name == "北海道" {
        return name;
    }
    name.strip_suffix(['都', '府', '県']).unwrap_or(name)
}

/// Prefecture value for a translated article.
///
/// Unknown values are kept as they are.
pub fn apply_policy(value: Option<&str>, policy: PrefecturePolicy) -> Option<String> {
    let value = value?;
    let mapped = match policy {
        PrefecturePolicy::Canonical => canonical_code(value),
        PrefecturePolicy::Localized => canonical_code(value).and_then(japanese_name),
    };
    Some(mapped.unwrap_or(value).to_string())
}
