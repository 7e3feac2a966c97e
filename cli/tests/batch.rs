use josamask_cli::inspect::inspect_pdf;
use josamask_cli::process::{process_pdfs, ProcessRequest, DEFAULT_SUFFIX};
use josamask_core::MaskConfig;
use josamask_text::HeuristicTokenizer;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::fs;
use std::path::Path;

const CMAP: &str = "/CIDInit /ProcSet findresource begin\n\
12 dict begin\nbegincmap\n\
1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
1 beginbfchar\n<0020> <0020>\nendbfchar\n\
1 beginbfrange\n<AC00> <D7A3> <AC00>\nendbfrange\n\
endcmap\nend\nend\n";

/// Single page, one Hangul line at 12pt.
fn write_pdf(path: &Path, line: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let cmap_id = doc.add_object(Stream::new(dictionary! {}, CMAP.as_bytes().to_vec()));
    let cid_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "NanumGothic",
        "DW" => 1000,
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "NanumGothic",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_id)],
        "ToUnicode" => cmap_id,
    });

    let bytes = line.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 760.into()]),
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn config() -> MaskConfig {
    MaskConfig {
        mask_ratio: 1.0,
        seed: Some(11),
        ..MaskConfig::default()
    }
}

#[test]
fn test_batch_reports_failures_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("lecture.pdf");
    let broken = dir.path().join("broken.pdf");
    write_pdf(&good, "학생은 열심히 공부했다");
    fs::write(&broken, b"%PDF-1.5 not really").unwrap();

    let out_dir = dir.path().join("out");
    let request = ProcessRequest {
        files: vec![good, broken],
        output_directory: out_dir.clone(),
        suffix: DEFAULT_SUFFIX.to_string(),
        verify: true,
        report: true,
    };
    let result = process_pdfs(&request, &config(), &HeuristicTokenizer::new()).unwrap();

    assert!(!result.success);
    assert_eq!(result.processed_files.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("broken.pdf: "), "{}", result.errors[0]);

    let output = out_dir.join("lecture_masked.pdf");
    assert!(output.exists());
    assert!(out_dir.join("lecture_masked.json").exists());

    let lines: Vec<String> = josamask_pdf::read_layouts(&fs::read(&output).unwrap())
        .unwrap()
        .iter()
        .flat_map(|page| josamask_core::layout::extract_lines(page))
        .map(|line| line.text().to_string())
        .collect();
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].contains("학생"));
    assert!(!lines[0].contains("공부"));
    assert!(lines[0].contains("열심히"));
}

#[test]
fn test_inspect_lists_masked_fragments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lecture.pdf");
    write_pdf(&path, "학생은 열심히 공부했다");

    let pages = inspect_pdf(&path, &config(), &HeuristicTokenizer::new()).unwrap();
    assert_eq!(pages.len(), 1);
    let line = &pages[0].lines[0];
    assert_eq!(line.text, "학생은 열심히 공부했다");
    assert_eq!(line.masked, vec!["학생".to_string(), "공부".to_string()]);
    assert!(line.tokens.iter().any(|t| t.form == "은" && t.tag == "JX"));

    // nothing was written next to the input
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
