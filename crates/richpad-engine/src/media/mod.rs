/*!
 * Media insertion adapter.
 *
 * Four input channels (URL prompt, file picker, drag-and-drop, paste)
 * normalize into one operation: insert a void image block at a target.
 * Invalid input (blank URL, non-image file, pasted text that is not an
 * image URL) degrades to a silent no-op or a pass-through to default text
 * handling; nothing here is an error.
 *
 * File contents are read asynchronously by [`MediaReader`]: one scoped task
 * per file, cancellable as a batch, delivering results through a bounded
 * channel instead of a callback closing over a possibly-stale editor.
 */

pub mod reader;

pub use reader::{FileInput, MediaReader, to_data_uri};

use crate::document::{Block, BlockKey, Snapshot};

/// File extensions accepted as image sources in pasted or dropped text.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

/// A normalized insertion request: every channel funnels into this.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInsert {
    pub src: String,
    /// Block to insert after; `None` means the current selection. The key
    /// is re-resolved against the latest snapshot at apply time, so a
    /// target that no longer exists degrades to the current selection
    /// rather than mutating stale structure.
    pub target: Option<BlockKey>,
}

impl ImageInsert {
    /// Insert a void image block carrying `src` after the target (or the
    /// current selection anchor).
    pub fn apply(&self, snapshot: &Snapshot) -> Snapshot {
        snapshot.insert_block(Block::image(&self.src), self.target)
    }
}

/// URL-prompt channel. Blank input means the user cancelled; both are a
/// no-op.
pub fn from_url_prompt(input: &str, target: Option<BlockKey>) -> Option<ImageInsert> {
    let src = input.trim();
    if src.is_empty() {
        return None;
    }
    Some(ImageInsert {
        src: src.to_string(),
        target,
    })
}

/// Paste / text-drop channel. The payload becomes an image source only when
/// it is a well-formed URL whose path carries a recognized image extension;
/// `None` tells the caller to forward the event to default text insertion.
pub fn from_text(payload: &str, target: Option<BlockKey>) -> Option<ImageInsert> {
    let candidate = payload.trim();
    if !is_image_url(candidate) {
        return None;
    }
    Some(ImageInsert {
        src: candidate.to_string(),
        target,
    })
}

/// Well-formed URL with an image file extension in its path.
pub fn is_image_url(text: &str) -> bool {
    let Ok(parsed) = url::Url::parse(text) else {
        return false;
    };
    let path = parsed.path();
    let Some((_, extension)) = path.rsplit_once('.') else {
        return false;
    };
    let extension = extension.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&extension.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockKind;
    use rstest::rstest;

    #[test]
    fn test_blank_url_prompt_is_a_noop() {
        assert_eq!(from_url_prompt("", None), None);
        assert_eq!(from_url_prompt("   ", None), None);
    }

    #[test]
    fn test_url_prompt_trims_input() {
        let insert = from_url_prompt("  https://x.com/pic.png \n", None).unwrap();
        assert_eq!(insert.src, "https://x.com/pic.png");
    }

    #[rstest]
    #[case("https://x.com/pic.png", true)]
    #[case("https://x.com/pic.JPEG", true)]
    #[case("https://x.com/a/b/photo.webp", true)]
    #[case("hello world", false)]
    #[case("https://x.com/page.html", false)]
    #[case("https://x.com/noextension", false)]
    #[case("x.com/pic.png", false)] // relative, not a well-formed URL
    fn test_is_image_url(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_image_url(text), expected);
    }

    #[test]
    fn test_pasted_plain_text_is_forwarded() {
        // Not an image URL: the caller falls through to text insertion.
        assert_eq!(from_text("hello world", None), None);
    }

    #[test]
    fn test_pasted_image_url_inserts_at_target() {
        let snapshot = crate::document::Snapshot::from_paragraphs(&["a", "b"]);
        let target = snapshot.root_keys()[0];

        let insert = from_text("https://x.com/pic.png", Some(target)).unwrap();
        let next = insert.apply(&snapshot);

        let inserted = next.root_keys()[1];
        assert_eq!(
            next.block(inserted).unwrap().kind,
            BlockKind::Image {
                src: "https://x.com/pic.png".to_string()
            }
        );
    }

    #[test]
    fn test_stale_target_degrades_to_current_selection() {
        let snapshot = crate::document::Snapshot::from_paragraphs(&["a", "b"]);
        let stale = crate::document::BlockKey::new();

        let insert = ImageInsert {
            src: "https://x.com/pic.png".to_string(),
            target: Some(stale),
        };
        let next = insert.apply(&snapshot);

        // Anchor was the last paragraph; the image lands after it.
        assert_eq!(
            next.block(next.root_keys()[2]).unwrap().kind,
            BlockKind::Image {
                src: "https://x.com/pic.png".to_string()
            }
        );
    }
}
