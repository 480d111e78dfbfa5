use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::cli::{ExportArgs, ExportFormat};
use crate::formats::BookRecord;

const UNTITLED_BOOK: &str = "Untitled Book";

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read input: {}", args.input))?;
    let saved: BookRecord = serde_json::from_str(&input).context("parse book json")?;
    let book = saved.clone().recounted();
    if book != saved {
        tracing::warn!(input = %args.input, "stored chapter counts disagree with chapters; recounted");
    }

    let rendered = match args.format {
        ExportFormat::Md => render_markdown(&book),
        ExportFormat::Json => render_json(&book)?,
    };
    write_output(Path::new(&args.out), &rendered, args.force)?;

    tracing::info!(format = ?args.format, out = %args.out, "exported book");
    Ok(())
}

/// Pretty JSON mirroring the record; non-ASCII text is written literally.
pub fn render_json(book: &BookRecord) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(book).context("serialize book json")?;
    json.push('\n');
    Ok(json)
}

/// Narrative document: book title, then every chapter that has content.
pub fn render_markdown(book: &BookRecord) -> String {
    let title = match book.book_details.title.as_str() {
        "" => UNTITLED_BOOK,
        title => title,
    };

    let mut md = String::new();
    md.push_str(&format!("# {title}\n\n"));
    md.push_str("---\n\n");

    for chapter in &book.chapters {
        let (Some(chapter_title), Some(content)) = (chapter.title(), chapter.content()) else {
            continue;
        };
        md.push_str(&format!("## {chapter_title}\n\n"));
        md.push_str(&format!("{content}\n\n"));
        md.push_str("---\n\n");
    }
    md
}

pub fn write_output(path: &Path, contents: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("export output already exists: {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("open output: {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write output: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush output: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{BookDetails, ChapterRecord};

    fn sample_book() -> BookRecord {
        BookRecord::new(
            "https://example.com/book",
            BookDetails {
                title: "গল্পগুচ্ছ".to_owned(),
                author: Some("লেখক: রবীন্দ্রনাথ".to_owned()),
            },
            vec![
                ChapterRecord::extracted(1, "https://example.com/1", "প্রথম", "প্রথম অধ্যায়ের লেখা"),
                ChapterRecord::failed(2, "https://example.com/2", "Failed to scrape chapter"),
                ChapterRecord::extracted(3, "https://example.com/3", "Third", "Line one\n\nLine two"),
            ],
        )
    }

    #[test]
    fn markdown_omits_error_chapters() {
        let md = render_markdown(&sample_book());
        assert_eq!(
            md,
            "# গল্পগুচ্ছ\n\n---\n\n\
## প্রথম\n\nপ্রথম অধ্যায়ের লেখা\n\n---\n\n\
## Third\n\nLine one\n\nLine two\n\n---\n\n"
        );
    }

    #[test]
    fn markdown_uses_placeholder_for_missing_title() {
        let book = BookRecord::new("https://example.com", BookDetails::default(), Vec::new());
        assert_eq!(render_markdown(&book), "# Untitled Book\n\n---\n\n");
    }

    #[test]
    fn json_keeps_unicode_literal_and_error_records() -> anyhow::Result<()> {
        let json = render_json(&sample_book())?;
        assert!(json.contains("গল্পগুচ্ছ"));
        assert!(!json.contains("\\u"));
        assert!(json.contains("\"error\": \"Failed to scrape chapter\""));
        assert!(json.contains("\"total_chapters\": 3"));
        Ok(())
    }

    #[test]
    fn export_recounts_hand_edited_json() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let input = temp.path().join("book.json");
        std::fs::write(
            &input,
            r#"{"url":"https://example.com/book","book_details":{"title":"Edited"},"total_chapters":7,
"chapters":[{"chapter_number":1,"url":"https://example.com/1","title":"One","content":"Short","content_length":1000}]}"#,
        )?;
        let out = temp.path().join("out.json");

        run(ExportArgs {
            input: input.display().to_string(),
            format: ExportFormat::Json,
            out: out.display().to_string(),
            force: false,
        })?;

        let book: BookRecord = serde_json::from_str(&std::fs::read_to_string(&out)?)?;
        assert_eq!(book.total_chapters, 1);
        assert_eq!(book.chapters[0].content_length(), 5);
        Ok(())
    }

    #[test]
    fn write_output_refuses_to_overwrite_without_force() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("nested").join("book.md");
        write_output(&path, "first", false)?;
        assert!(write_output(&path, "second", false).is_err());
        write_output(&path, "third", true)?;
        assert_eq!(std::fs::read_to_string(&path)?, "third");
        Ok(())
    }
}
