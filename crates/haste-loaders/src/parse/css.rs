//! Stylesheet scraping.

use once_cell::sync::Lazy;
use regex::Regex;

static FB_SPRITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"-fb-sprite\s*:\s*url\s*\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("static regex")
});

/// Distinct `-fb-sprite: url(...)` targets with any leading `/` removed.
pub fn extract_fb_sprites(source: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in FB_SPRITE_RE.captures_iter(source) {
        let sprite = caps[1].trim_start_matches('/');
        if !out.iter().any(|seen| seen == sprite) {
            out.push(sprite.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fb_sprites() {
        let css = r#"
            .a { -fb-sprite: url(/images/a.png); }
            .b { -fb-sprite : url( 'images/b.png' ) }
            .c { -fb-sprite: url("/images/a.png"); }
        "#;
        assert_eq!(extract_fb_sprites(css), vec!["images/a.png", "images/b.png"]);
    }
}
