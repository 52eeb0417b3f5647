/*!
 * Mock provider helpers for testing
 *
 * The scriptable provider lives in the library so unit tests can use it too;
 * this module re-exports it and adds canned response generators.
 */

pub use tabiyaku::providers::mock::{MockBehavior, MockProvider, MockRequest};

/// English answers for the sample article, tagged text for anything else
pub fn english_glossary(request: &MockRequest) -> String {
    let known = match request.text.as_str() {
        "嵐山の竹林" => Some("Arashiyama Bamboo Grove"),
        "arashiyama bamboo" => Some("arashiyama bamboo"),
        "嵐山" => Some("Arashiyama"),
        "京都" => Some("Kyoto"),
        "自然" => Some("Nature"),
        "朝早く行くのがおすすめです。" => Some("Going early in the morning is recommended."),
        "公式サイト" => Some("Official site"),
        "京都の定番スポット" => Some("A classic Kyoto spot"),
        _ => None,
    };

    match known {
        Some(text) if request.target_code.starts_with("EN") => text.to_string(),
        _ => MockProvider::tagged(request),
    }
}
