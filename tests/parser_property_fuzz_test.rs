use guide_nav::Page;
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{TestCaseError, TestCaseResult};

fn tag_name_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("div"),
        Just("p"),
        Just("span"),
        Just("section"),
        Just("ul"),
        Just("li"),
        Just("h3"),
        Just("a"),
        Just("pre"),
        Just("DIV"),
        Just("H3"),
    ]
    .prop_map(str::to_string)
    .boxed()
}

fn attribute_soup_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just(""),
        Just(" class='scribe-step'"),
        Just(" class=\"container-narrow\""),
        Just(" id=\"x\""),
        Just(" id='search-container'"),
        Just(" data-flag"),
        Just(" href='#frag'"),
        Just(" style='height: 40px'"),
        Just(" style='display: none'"),
        Just(" checked disabled"),
        Just(" title=unquoted"),
        Just(" ="),
        Just(" 'loose'"),
    ]
    .prop_map(str::to_string)
    .boxed()
}

fn text_soup_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just(""),
        Just("plain words"),
        Just("Fish &amp; Chips"),
        Just("&copy; &#169; &#x41; &#xZZ;"),
        Just("&notreal; &amp"),
        Just("résumé 日本語 ✨"),
        Just("a < b > c"),
        Just("100% > 50%"),
    ]
    .prop_map(str::to_string)
    .boxed()
}

fn fragment_strategy() -> BoxedStrategy<String> {
    let leaf = prop_oneof![
        text_soup_strategy(),
        (
            tag_name_strategy(),
            attribute_soup_strategy(),
            text_soup_strategy(),
        )
            .prop_map(|(tag, attrs, text)| format!("<{tag}{attrs}>{text}</{tag}>")),
        (tag_name_strategy(), attribute_soup_strategy())
            .prop_map(|(tag, attrs)| format!("<{tag}{attrs}>")),
        tag_name_strategy().prop_map(|tag| format!("</{tag}>")),
        Just("<!-- note -->".to_string()),
        Just("<!-- unterminated".to_string()),
        Just("<!DOCTYPE html>".to_string()),
        Just("<br><hr><input value='v'>".to_string()),
        Just("<script>if (a < b) { go(); }</script>".to_string()),
        Just("<script>open".to_string()),
        Just("<style>p { color: red }</style>".to_string()),
        Just("<".to_string()),
        Just("<<>>".to_string()),
        Just("<a".to_string()),
        Just("<ul><li>one<li>two</ul>".to_string()),
    ]
    .boxed();

    leaf.prop_recursive(3, 64, 6, |inner| {
        prop_oneof![
            (tag_name_strategy(), vec(inner.clone(), 0..=4))
                .prop_map(|(tag, children)| format!("<{tag}>{}</{tag}>", children.concat())),
            vec(inner.clone(), 0..=4).prop_map(|children| children.concat()),
        ]
    })
    .boxed()
}

fn page_soup_strategy() -> BoxedStrategy<String> {
    vec(fragment_strategy(), 0..=8)
        .prop_map(|fragments| fragments.concat())
        .boxed()
}

fn label_char_strategy() -> BoxedStrategy<char> {
    prop_oneof![
        Just('a'),
        Just('b'),
        Just('x'),
        Just('A'),
        Just('Z'),
        Just('0'),
        Just('3'),
        Just('9'),
        Just(' '),
        Just('\t'),
        Just('-'),
        Just('_'),
        Just('!'),
        Just('&'),
        Just('<'),
        Just('>'),
        Just('%'),
        Just('('),
        Just(')'),
        Just('.'),
        Just('é'),
        Just('ß'),
        Just('日'),
    ]
    .boxed()
}

fn label_strategy() -> BoxedStrategy<String> {
    vec(label_char_strategy(), 0..=16)
        .prop_map(|chars| chars.into_iter().collect())
        .boxed()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn assert_load_path_never_panics(html: &str) -> TestCaseResult {
    let outcome = std::panic::catch_unwind(|| Page::from_html(html));
    prop_assert!(
        outcome.is_ok(),
        "Page::from_html panicked for generated markup:\n{html}"
    );
    Ok(())
}

fn assert_labels_become_valid_anchors(labels: &[String]) -> TestCaseResult {
    let sections: String = labels
        .iter()
        .map(|label| {
            format!(
                "<h3 class='scribe-section'>{}</h3><div style='height: 200px'>body</div>",
                escape_text(label)
            )
        })
        .collect();
    let html = format!(
        "<div class='container-narrow'><div class='scribe-container'>{sections}</div></div>"
    );

    let page =
        Page::from_html(&html).map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    let entries = page.nav_entries();
    prop_assert_eq!(entries.len(), labels.len());

    for (entry, label) in entries.iter().zip(labels) {
        prop_assert_eq!(entry.label.as_str(), label.trim());
        prop_assert!(
            !entry.anchor_id.is_empty(),
            "empty anchor for label {label:?}"
        );
        prop_assert!(
            entry
                .anchor_id
                .chars()
                .all(|ch| ch.is_ascii_lowercase()
                    || ch.is_ascii_digit()
                    || ch == '-'
                    || ch == '_'),
            "anchor {:?} for label {label:?} has characters outside the slug set",
            entry.anchor_id
        );
        prop_assert!(
            !entry.anchor_id.starts_with('-') && !entry.anchor_id.ends_with('-'),
            "anchor {:?} for label {label:?} keeps a boundary hyphen",
            entry.anchor_id
        );
        prop_assert!(
            page.exists(&format!("#{}", entry.anchor_id)).unwrap_or(false),
            "anchor {:?} for label {label:?} resolves to nothing",
            entry.anchor_id
        );
    }

    let replay = Page::from_html(&html).map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    prop_assert_eq!(
        entries,
        replay.nav_entries(),
        "anchor assignment is not deterministic"
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn generated_tag_soup_never_panics_the_load_path(html in page_soup_strategy()) {
        assert_load_path_never_panics(&html)?;
    }

    #[test]
    fn generated_section_labels_always_make_valid_anchors(
        labels in vec(label_strategy(), 2..=6)
    ) {
        assert_labels_become_valid_anchors(&labels)?;
    }
}
