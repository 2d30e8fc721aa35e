use super::*;

#[test]
fn markdown_headings_and_paragraphs() {
    let markdown = "# Getting Started\n\nInstall the *toolchain* first.\nThen build.\n\n## Usage\n\nRun `mlir-opt`.";
    let text = markdown_to_text(markdown);

    assert_eq!(
        text,
        "Getting Started\n\nInstall the toolchain first.\nThen build.\n\nUsage\n\nRun mlir-opt."
    );
}

#[test]
fn markdown_lists_and_code_blocks() {
    let markdown = "Steps:\n\n- one\n- two\n\n```bash\ncargo build\n```\n";
    let text = markdown_to_text(markdown);

    assert!(text.contains("- one\n- two"));
    assert!(text.contains("cargo build"));
    assert!(!text.contains("```"));
}

#[test]
fn markdown_drops_raw_html() {
    let text = markdown_to_text("<div class=\"note\">\n\nVisible text\n\n</div>");
    assert_eq!(text, "Visible text");
}

#[test]
fn html_visible_text_only() {
    let html = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Ignored title</title><style>body { color: red; }</style></head>
        <body>
            <h1>Passes</h1>
            <p>The   pass manager
               runs passes.</p>
            <script>console.log("hidden");</script>
            <ul><li>first</li><li>second</li></ul>
        </body>
        </html>
    "#;
    let text = html_to_text(html);

    assert!(text.starts_with("Passes\n\nThe pass manager runs passes."));
    assert!(text.contains("first\nsecond"));
    assert!(!text.contains("hidden"));
    assert!(!text.contains("Ignored title"));
    assert!(!text.contains("color: red"));
}

#[test]
fn html_preformatted_text_keeps_line_breaks() {
    let html = "<html><body><pre>line one\nline two</pre></body></html>";
    let text = html_to_text(html);
    assert_eq!(text, "line one\nline two");
}

#[test]
fn markdown_code_blocks_keep_indentation() {
    let markdown = "Example:\n\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n\nDone.";
    let text = markdown_to_text(markdown);

    assert_eq!(text, "Example:\n\nfn main() {\n    println!(\"hi\");\n}\n\nDone.");
}

#[test]
fn html_preformatted_text_keeps_indentation() {
    let html = "<html><body><p>Before</p><pre>if ready:\n    run()\n\tdone()</pre>\n  <p>\n   After</p></body></html>";
    let text = html_to_text(html);

    assert_eq!(text, "Before\n\nif ready:\n    run()\n\tdone()\n\nAfter");
}

#[test]
fn empty_inputs() {
    assert_eq!(markdown_to_text(""), "");
    assert_eq!(html_to_text(""), "");
    assert_eq!(html_to_text("<html><body>   </body></html>"), "");
}
