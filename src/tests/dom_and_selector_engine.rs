use super::*;

#[test]
fn list_items_and_paragraphs_close_implicitly() -> Result<()> {
    let page = Page::from_html("<ul><li>A<li>B</ul><p>one<div>two</div>")?;
    assert_eq!(page.count("li")?, 2);
    page.assert_text("ul", "AB")?;
    // The div terminated the open paragraph instead of nesting in it.
    assert_eq!(page.count("p div")?, 0);
    page.assert_text("div", "two")?;
    Ok(())
}

#[test]
fn void_tags_and_valueless_attributes_parse() -> Result<()> {
    let page = Page::from_html("<input disabled><img src='x.png'><br>")?;
    assert_eq!(page.attr_of("input", "disabled")?, Some("true".to_string()));
    assert!(page.exists("img[src='x.png']")?);

    let dump = page.dump_dom();
    assert!(dump.contains("<br>"));
    assert!(!dump.contains("</br>"));
    Ok(())
}

#[test]
fn character_references_decode_once() -> Result<()> {
    let page = Page::from_html(
        "<p>Fish &amp; Chips &copy; &#169; &#x41;</p><span>&notreal; &amp tail</span>",
    )?;
    page.assert_text("p", "Fish & Chips © © A")?;
    // Unknown names and references missing their semicolon stay literal.
    page.assert_text("span", "&notreal; &amp tail")?;
    Ok(())
}

#[test]
fn script_and_style_bodies_stay_raw() -> Result<()> {
    let page =
        Page::from_html(r"<script>if (x < 3) { run(); }</script><style>p > b {}</style><div>after</div>")?;
    assert_eq!(page.text_of("script")?, "if (x < 3) { run(); }");
    assert_eq!(page.text_of("style")?, "p > b {}");
    assert_eq!(page.count("script *")?, 0);
    page.assert_text("div", "after")?;
    Ok(())
}

#[test]
fn title_text_is_entity_decoded() -> Result<()> {
    let page = Page::from_html("<title>Guides &mdash; Index</title>")?;
    assert_eq!(page.text_of("title")?, "Guides — Index");
    Ok(())
}

#[test]
fn comments_and_doctype_are_skipped() -> Result<()> {
    let html = "<!DOCTYPE html><!-- note --><div>kept</div><!-- <span>nope</span> -->";
    let page = Page::from_html(html)?;
    assert_eq!(page.count("span")?, 0);
    page.assert_text("div", "kept")?;
    Ok(())
}

#[test]
fn selector_combinators_groups_and_attributes_match() -> Result<()> {
    let html = r#"
        <div id='top' class='panel wide'>
          <p class='note first'>one</p>
          <section><p class='note'>two</p></section>
        </div>
        <p class='note'>outside</p>
        "#;
    let page = Page::from_html(html)?;

    assert_eq!(page.count(".note")?, 3);
    assert_eq!(page.count("div .note")?, 2);
    assert_eq!(page.count("div > .note")?, 1);
    assert_eq!(page.count("p.first, #top > section")?, 2);
    assert_eq!(page.count("*")?, 5);
    assert_eq!(page.count("[class]")?, 4);
    assert_eq!(page.count("[id='top']")?, 1);
    // Tag names compare case-insensitively.
    assert_eq!(page.count("DIV")?, 1);
    assert!(page.exists("div.panel.wide")?);
    Ok(())
}

#[test]
fn unsupported_selector_forms_are_rejected() -> Result<()> {
    let page = Page::from_html("<p>x</p>")?;
    for selector in ["p:first-child", "p ~ div", "[href^='x']", ""] {
        match page.exists(selector) {
            Err(Error::UnsupportedSelector(..)) => {}
            other => panic!("expected unsupported selector error for {selector:?}, got: {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn assertions_report_expected_actual_and_a_snippet() -> Result<()> {
    let mut page = Page::from_html("<div id='w'>hello</div><input id='f'>")?;

    match page.assert_text("#w", "bye") {
        Err(Error::AssertionFailed {
            selector,
            expected,
            actual,
            dom_snippet,
        }) => {
            assert_eq!(selector, "#w");
            assert_eq!(expected, "bye");
            assert_eq!(actual, "hello");
            assert!(dom_snippet.contains("<div"));
        }
        other => panic!("expected assertion failure, got: {other:?}"),
    }

    match page.select_one("#missing") {
        Err(Error::SelectorNotFound(selector)) => assert_eq!(selector, "#missing"),
        other => panic!("expected missing selector error, got: {other:?}"),
    }

    match page.type_text("#w", "x") {
        Err(Error::TypeMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, "input or textarea");
            assert_eq!(actual, "div");
        }
        other => panic!("expected type mismatch, got: {other:?}"),
    }

    page.type_text("#f", "abc")?;
    page.assert_value("#f", "abc")?;
    assert_eq!(page.value_of("#f")?, "abc");
    Ok(())
}

#[test]
fn blocks_stack_and_hidden_subtrees_collapse() -> Result<()> {
    let html = r#"
        <div id='a' style='height: 150px'>text inside</div>
        <div id='b'><p>p1</p><p>p2</p></div>
        <div id='c' style='display: none'><p>hidden</p></div>
        "#;
    let mut page = Page::from_html(html)?;

    // Explicit height wins over the text line; #b sums its children.
    assert_eq!(page.rect_of("#a")?, Rect { top: 0, bottom: 150, height: 150 });
    assert_eq!(page.rect_of("#b")?, Rect { top: 150, bottom: 190, height: 40 });
    assert_eq!(page.rect_of("#b p")?.top, 150);
    assert_eq!(page.rect_of("#c")?.height, 0);
    assert_eq!(page.document_height(), 190);

    // Shorter than the viewport, so every scroll clamps back to zero.
    page.scroll_to(50)?;
    assert_eq!(page.scroll_y(), 0);
    Ok(())
}

#[test]
fn dump_normalizes_attributes_and_escapes_text() -> Result<()> {
    let page = Page::from_html("<div id='z' class='k'><b>t</b></div><p>&lt;tag&gt;</p>")?;
    let dump = page.dump_dom();
    assert!(dump.contains(r#"<div class="k" id="z"><b>t</b></div>"#));
    assert!(dump.contains("&lt;tag&gt;"));
    page.assert_text("p", "<tag>")?;
    Ok(())
}

#[test]
fn trace_log_captures_page_activity() -> Result<()> {
    let html = r#"
        <div class='container-narrow'>
          <div class='scribe-container'>
            <h3 class='scribe-section' style='height: 200px'>Alpha</h3>
            <div style='height: 700px'>body</div>
            <h3 class='scribe-section' style='height: 200px'>Beta</h3>
          </div>
        </div>
        "#;
    let mut page = Page::from_html(html)?;

    page.enable_trace();
    page.click("a[href='#beta']")?;
    page.advance_time(50)?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[event] click")));
    assert!(logs.iter().any(|line| line.contains("[nav] replace #beta")));
    assert!(logs.iter().any(|line| line.starts_with("[scroll] y=")));
    assert!(logs.iter().any(|line| line.starts_with("[timer] run id=")));
    assert!(logs.iter().any(|line| line.contains("[spy] current section:")));

    assert!(page.take_trace_logs().is_empty());
    Ok(())
}
