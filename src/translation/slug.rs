/*!
 * URL slugs for translated articles.
 *
 * Slugs are lowercase ASCII words joined by single hyphens. Accented Latin
 * letters are folded to their base letter; every other character separates
 * words. Text with no usable letters has no slug.
 */

/// Turn free text into a slug, or `None` if nothing usable remains
pub fn slugify(text: &str) -> Option<String> {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(fold_char) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() { None } else { Some(slug) }
}

/// Fold accented Latin letters to ASCII
fn fold_char(c: char) -> impl Iterator<Item = char> {
    let folded: &[char] = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' | 'ă' => &['a'],
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ą' | 'Ă' => &['a'],
        'æ' | 'Æ' => &['a', 'e'],
        'ç' | 'ć' | 'č' | 'Ç' | 'Ć' | 'Č' => &['c'],
        'ď' | 'Ď' | 'ð' | 'Ð' => &['d'],
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => &['e'],
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => &['e'],
        'ğ' | 'Ğ' => &['g'],
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' | 'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => &['i'],
        'ł' | 'Ł' => &['l'],
        'ñ' | 'ń' | 'ň' | 'Ñ' | 'Ń' | 'Ň' => &['n'],
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => &['o'],
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => &['o'],
        'œ' | 'Œ' => &['o', 'e'],
        'ř' | 'Ř' => &['r'],
        'ś' | 'š' | 'ş' | 'Ś' | 'Š' | 'Ş' => &['s'],
        'ß' => &['s', 's'],
        'ť' | 'ţ' | 'Ť' | 'Ţ' => &['t'],
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => &['u'],
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => &['u'],
        'ý' | 'ÿ' | 'Ý' | 'Ÿ' => &['y'],
        'ź' | 'ż' | 'ž' | 'Ź' | 'Ż' | 'Ž' => &['z'],
        'þ' | 'Þ' => &['t', 'h'],
        _ => return FoldIter::Single(Some(c)),
    };
    FoldIter::Many(folded.iter())
}

enum FoldIter {
    Single(Option<char>),
    Many(std::slice::Iter<'static, char>),
}

impl Iterator for FoldIter {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        match self {
            Self::Single(c) => c.take(),
            Self::Many(chars) => chars.next().copied(),
        }
    }
}

/// Inputs for deriving a translated slug, in priority order
#[derive(Debug, Clone, Copy)]
pub struct SlugSources<'a> {
    /// Translated article title
    pub translated_title: &'a str,
    /// Translation of the source slug's words
    pub translated_slug_text: &'a str,
    /// Slug of the source article
    pub source_slug: &'a str,
    /// Title of the source article
    pub source_title: &'a str,
    /// Id of the source article
    pub source_id: &'a str,
}

/// Source slug without its trailing `-<language>` marker
pub fn strip_language_suffix<'a>(slug: &'a str, language: &str) -> &'a str {
    let suffix = format!("-{}", language);
    let Some(start) = slug.len().checked_sub(suffix.len()) else {
        return slug;
    };
    match slug.get(start..) {
        Some(tail) if tail.eq_ignore_ascii_case(&suffix) => &slug[..start],
        _ => slug,
    }
}

/// Words of the source slug, used as translatable text
pub fn slug_source_text(source_slug: &str, source_language: &str) -> String {
    strip_language_suffix(source_slug, source_language)
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive the slug of a translated article.
///
/// The first candidate that slugifies wins: translated title, translated slug
/// text, source slug without its language marker, source title, source id.
/// The target language is appended as a marker.
pub fn derive_translated_slug(sources: &SlugSources<'_>, source_language: &str, target_language: &str) -> String {
    let base = slugify(sources.translated_title)
        .or_else(|| slugify(sources.translated_slug_text))
        .or_else(|| slugify(strip_language_suffix(sources.source_slug, source_language)))
        .or_else(|| slugify(sources.source_title))
        .or_else(|| slugify(sources.source_id))
        .unwrap_or_else(|| "article".to_string());

    match slugify(target_language) {
        Some(marker) => format!("{}-{}", base, marker),
        None => base,
    }
}
