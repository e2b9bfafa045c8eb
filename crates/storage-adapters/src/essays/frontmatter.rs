use chrono::NaiveDate;
use domains::Essay;
use serde::Deserialize;

/// Metadata block at the top of an essay file. Every key is optional; empty
/// YAML values come through as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontMatter {
    title: Option<String>,
    subtitle: Option<String>,
    category: Option<String>,
    author: Option<String>,
    date: Option<String>,
    published_at: Option<String>,
    image: Option<String>,
    excerpt: Option<String>,
    featured: Option<bool>,
}

/// Splits `---`-delimited YAML front matter from the body.
///
/// Returns `None` if the input does not open with a front matter block.
pub fn split_front_matter(input: &str) -> Option<(&str, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lines = input.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if matches!(line.trim_end(), "---" | "...") {
            return Some((&input[start..offset], &input[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Accepts `2024-03-01` as well as full timestamps such as `2024-03-01T09:00:00Z`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

/// Builds an essay from a file's contents. A file without front matter is all body.
pub fn parse_essay(slug: &str, raw: &str) -> Result<Essay, serde_yaml::Error> {
    let (meta, body) = match split_front_matter(raw) {
        Some((yaml, body)) if !yaml.trim().is_empty() => (serde_yaml::from_str(yaml)?, body),
        Some((_, body)) => (FrontMatter::default(), body),
        None => (FrontMatter::default(), raw),
    };

    Ok(Essay {
        slug: slug.to_string(),
        title: meta.title.unwrap_or_else(|| slug.to_string()),
        subtitle: meta.subtitle.unwrap_or_default(),
        category: meta.category.unwrap_or_default(),
        author: meta.author.unwrap_or_default(),
        date: meta.date.or(meta.published_at).as_deref().and_then(parse_date),
        image: meta.image.unwrap_or_default(),
        excerpt: meta.excerpt.unwrap_or_default(),
        content: body.trim_start_matches(|c: char| c == '\r' || c == '\n').to_string(),
        featured: meta.featured.unwrap_or(false),
    })
}
