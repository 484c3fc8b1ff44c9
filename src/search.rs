use super::*;
use unicode_normalization::UnicodeNormalization;

pub(crate) const MIN_QUERY_LEN: usize = 2;

/// Word-alias table consulted when expanding a query.
///
/// Lookup is by whole query string, lower-cased; an unknown query
/// simply expands to itself. The table is plain owned data so tests
/// and embedders can construct their own instead of relying on the
/// built-in vocabulary.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    map: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table where every word in a group aliases every other
    /// word of the same group.
    pub fn from_groups(groups: &[&[&str]]) -> Self {
        let mut table = Self::new();
        for group in groups {
            for word in *group {
                let aliases: Vec<&str> = group
                    .iter()
                    .filter(|other| *other != word)
                    .copied()
                    .collect();
                table.insert(word, &aliases);
            }
        }
        table
    }

    /// The stock vocabulary for guide pages. Mostly symmetric groups;
    /// `page` is reachable as an alias of the dashboard words but is
    /// not a key itself.
    pub fn builtin() -> Self {
        let mut table = Self::new();

        table.insert("create", &["add", "new", "make", "generate"]);
        table.insert("add", &["create", "new", "make", "generate"]);
        table.insert("new", &["create", "add", "make", "generate"]);
        table.insert("make", &["create", "add", "new", "generate"]);
        table.insert("generate", &["create", "add", "new", "make"]);

        table.insert("report", &["form", "submission", "document"]);
        table.insert("form", &["report", "submission", "document"]);
        table.insert("submission", &["report", "form", "document"]);
        table.insert("document", &["report", "form", "submission"]);

        table.insert("submit", &["send", "save", "complete"]);
        table.insert("send", &["submit", "save", "complete"]);
        table.insert("save", &["submit", "send", "complete"]);
        table.insert("complete", &["submit", "send", "save"]);

        table.insert("client", &["customer", "organization", "company"]);
        table.insert("customer", &["client", "organization", "company"]);
        table.insert("organization", &["client", "customer", "company"]);
        table.insert("company", &["client", "customer", "organization"]);

        table.insert("partner", &["user", "account"]);
        table.insert("user", &["partner", "account"]);
        table.insert("account", &["partner", "user"]);

        table.insert("dashboard", &["portal", "interface", "page"]);
        table.insert("portal", &["dashboard", "interface", "page"]);
        table.insert("interface", &["dashboard", "portal", "page"]);

        table.insert("search", &["find", "locate", "lookup"]);
        table.insert("find", &["search", "locate", "lookup"]);
        table.insert("locate", &["search", "find", "lookup"]);
        table.insert("lookup", &["search", "find", "locate"]);

        table.insert("edit", &["modify", "change", "update"]);
        table.insert("modify", &["edit", "change", "update"]);
        table.insert("change", &["edit", "modify", "update"]);
        table.insert("update", &["edit", "modify", "change"]);

        table.insert("delete", &["remove", "erase"]);
        table.insert("remove", &["delete", "erase"]);
        table.insert("erase", &["delete", "remove"]);

        table.insert("view", &["see", "display", "show"]);
        table.insert("see", &["view", "display", "show"]);
        table.insert("display", &["view", "see", "show"]);
        table.insert("show", &["view", "see", "display"]);

        table
    }

    pub fn insert(&mut self, word: &str, aliases: &[&str]) {
        self.map.insert(
            word.to_lowercase(),
            aliases.iter().map(|alias| alias.to_lowercase()).collect(),
        );
    }

    pub fn aliases(&self, word: &str) -> &[String] {
        self.map
            .get(&word.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// The query itself plus its aliases, lower-cased.
    pub fn expand(&self, query: &str) -> Vec<String> {
        let lowered = query.to_lowercase();
        let mut terms = vec![lowered.clone()];
        terms.extend(self.aliases(&lowered).iter().cloned());
        terms
    }
}

/// One searchable guide card, captured at page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRecord {
    pub title: String,
    pub description: String,
    pub href: String,
    /// Lower-cased, NFC-normalized `title description` field the
    /// substring match runs against.
    pub normalized_text: String,
}

pub(crate) fn normalize_search_text(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

impl Page {
    /// Installs the search box and indexes the guide cards.
    ///
    /// Pages without a `#search-container` element get no search UI.
    /// The container's previous content is replaced by the input and
    /// an (initially empty) results panel.
    pub(crate) fn setup_search(&mut self) -> Result<()> {
        let Some(container) = self.dom.by_id("search-container") else {
            return Ok(());
        };

        self.dom.set_text_content(container, "");
        let wrapper = self
            .dom
            .create_element(container, "div".to_string(), HashMap::new());
        self.dom.set_attr(wrapper, "class", "search-wrapper");

        let input = self
            .dom
            .create_element(wrapper, "input".to_string(), HashMap::new());
        self.dom.set_attr(input, "type", "text");
        self.dom.set_attr(input, "id", "search-input");
        self.dom.set_attr(input, "class", "search-input");
        self.dom.set_attr(input, "placeholder", "Search guides...");
        self.dom.set_attr(input, "autocomplete", "off");

        let results = self
            .dom
            .create_element(wrapper, "div".to_string(), HashMap::new());
        self.dom.set_attr(results, "id", "search-results");
        self.dom.set_attr(results, "class", "search-results");
        self.dom.style_set(results, "display", "none");

        let cards = selector::query_selector_all(&self.dom, "a.guide-card[href]")?;
        let mut records = Vec::with_capacity(cards.len());
        for card in cards {
            let title = match selector::query_selector_from(&self.dom, card, "h3")? {
                Some(heading) => self.dom.text_content(heading),
                None => String::new(),
            };
            let description = match selector::query_selector_from(&self.dom, card, "p")? {
                Some(paragraph) => self.dom.text_content(paragraph),
                None => String::new(),
            };
            let href = self.dom.attr(card, "href").unwrap_or_default();
            let normalized_text = normalize_search_text(&format!("{title} {description}"));
            records.push(SearchRecord {
                title,
                description,
                href,
                normalized_text,
            });
        }

        self.trace(format!("[search] indexed {} cards", records.len()));
        self.search_records = records;
        self.listeners.add(input, "input", Action::SearchQuery);
        Ok(())
    }

    /// Runs the current input value against the index and renders the
    /// results panel.
    pub(crate) fn run_search_query(&mut self) -> Result<()> {
        let Some(input) = self.dom.by_id("search-input") else {
            return Ok(());
        };
        let Some(results) = self.dom.by_id("search-results") else {
            return Ok(());
        };

        let raw_query = self.dom.value(input).unwrap_or_default().trim().to_string();
        if raw_query.chars().count() < MIN_QUERY_LEN {
            self.dom.style_set(results, "display", "none");
            return Ok(());
        }

        let needle = normalize_search_text(&raw_query);
        let terms = self.synonyms.expand(&needle);
        let matches: Vec<SearchRecord> = self
            .search_records
            .iter()
            .filter(|record| {
                terms
                    .iter()
                    .any(|term| record.normalized_text.contains(term.as_str()))
            })
            .cloned()
            .collect();

        self.trace(format!(
            "[search] query '{raw_query}' matched {} of {}",
            matches.len(),
            self.search_records.len()
        ));

        self.dom.set_text_content(results, "");
        if matches.is_empty() {
            let empty = self
                .dom
                .create_element(results, "div".to_string(), HashMap::new());
            self.dom.set_attr(empty, "class", "search-no-results");
            self.dom.set_text_content(empty, "No guides found");
        } else {
            for record in &matches {
                let item = self
                    .dom
                    .create_element(results, "div".to_string(), HashMap::new());
                self.dom.set_attr(item, "class", "search-result-item");

                let heading = self
                    .dom
                    .create_element(item, "h4".to_string(), HashMap::new());
                let link = self
                    .dom
                    .create_element(heading, "a".to_string(), HashMap::new());
                self.dom.set_attr(link, "href", &record.href);
                self.append_highlighted(link, &record.title, &raw_query);

                let paragraph = self
                    .dom
                    .create_element(item, "p".to_string(), HashMap::new());
                self.append_highlighted(paragraph, &record.description, &raw_query);
            }
        }
        self.dom.style_set(results, "display", "block");
        Ok(())
    }

    /// Appends `text` under `parent`, wrapping each case-insensitive
    /// occurrence of `query` in a `<mark>` element. The query is
    /// matched literally, not as a pattern.
    fn append_highlighted(&mut self, parent: NodeId, text: &str, query: &str) {
        let pattern = text_regex::escape(query);
        let regex = match text_regex::RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => regex,
            Err(_) => {
                if !text.is_empty() {
                    self.dom.create_text(parent, text.to_string());
                }
                return;
            }
        };

        let mut cursor = 0usize;
        for found in regex.find_all(text) {
            if found.start > cursor {
                self.dom
                    .create_text(parent, text[cursor..found.start].to_string());
            }
            let mark = self
                .dom
                .create_element(parent, "mark".to_string(), HashMap::new());
            self.dom.create_text(mark, found.text.clone());
            cursor = found.end;
        }
        if cursor < text.len() {
            self.dom.create_text(parent, text[cursor..].to_string());
        }
    }
}
