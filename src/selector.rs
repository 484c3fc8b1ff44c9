use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

/// One compound selector: `a.nav-link[href]` is a single step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

/// A step plus the combinator relating it to the step before it. The
/// first part of a chain always carries `Descendant`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    pub(crate) combinator: SelectorCombinator,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let mut groups = Vec::new();
    for group in split_selector_groups(selector) {
        let group = group.trim();
        if group.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        groups.push(parse_selector_chain(group)?);
    }
    if groups.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(groups)
}

/// Splits a selector list on top-level commas, leaving commas inside
/// attribute brackets or quotes alone.
fn split_selector_groups(selector: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(open) = quote {
            current.push(ch);
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                groups.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    groups.push(current);
    groups
}

fn parse_selector_chain(chain: &str) -> Result<Vec<SelectorPart>> {
    let mut parts = Vec::new();
    let mut combinator = SelectorCombinator::Descendant;
    let mut pending_child = false;

    for token in tokenize_selector_chain(chain)? {
        match token {
            ChainToken::Child => {
                if pending_child || parts.is_empty() {
                    return Err(Error::UnsupportedSelector(chain.to_string()));
                }
                pending_child = true;
                combinator = SelectorCombinator::Child;
            }
            ChainToken::Compound(compound) => {
                parts.push(SelectorPart {
                    step: parse_selector_step(&compound)?,
                    combinator,
                });
                combinator = SelectorCombinator::Descendant;
                pending_child = false;
            }
        }
    }

    if parts.is_empty() || pending_child {
        return Err(Error::UnsupportedSelector(chain.to_string()));
    }
    Ok(parts)
}

enum ChainToken {
    Compound(String),
    Child,
}

fn tokenize_selector_chain(chain: &str) -> Result<Vec<ChainToken>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in chain.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(chain.to_string()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ch if ch.is_whitespace() && bracket_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(ChainToken::Compound(std::mem::take(&mut current)));
                }
            }
            '>' if bracket_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(ChainToken::Compound(std::mem::take(&mut current)));
                }
                tokens.push(ChainToken::Child);
            }
            _ => current.push(ch),
        }
    }
    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(chain.to_string()));
    }
    if !current.is_empty() {
        tokens.push(ChainToken::Compound(current));
    }
    Ok(tokens)
}

fn parse_selector_step(compound: &str) -> Result<SelectorStep> {
    let mut step = SelectorStep::default();
    let chars: Vec<char> = compound.chars().collect();
    let mut i = 0usize;

    if i < chars.len() && chars[i] == '*' {
        step.universal = true;
        i += 1;
    } else if i < chars.len() && is_selector_ident_char(chars[i]) {
        let ident = read_selector_ident(&chars, &mut i);
        step.tag = Some(ident.to_ascii_lowercase());
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                let ident = read_selector_ident(&chars, &mut i);
                if ident.is_empty() {
                    return Err(Error::UnsupportedSelector(compound.to_string()));
                }
                step.id = Some(ident);
            }
            '.' => {
                i += 1;
                let ident = read_selector_ident(&chars, &mut i);
                if ident.is_empty() {
                    return Err(Error::UnsupportedSelector(compound.to_string()));
                }
                step.classes.push(ident);
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|ch| *ch == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| Error::UnsupportedSelector(compound.to_string()))?;
                let body: String = chars[i + 1..close].iter().collect();
                step.attrs
                    .push(parse_selector_attr_condition(&body, compound)?);
                i = close + 1;
            }
            _ => return Err(Error::UnsupportedSelector(compound.to_string())),
        }
    }

    if step.tag.is_none()
        && !step.universal
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
    {
        return Err(Error::UnsupportedSelector(compound.to_string()));
    }
    Ok(step)
}

fn parse_selector_attr_condition(body: &str, compound: &str) -> Result<SelectorAttrCondition> {
    let body = body.trim();
    let Some((key, value)) = body.split_once('=') else {
        if body.is_empty() || !body.chars().all(is_selector_ident_char) {
            return Err(Error::UnsupportedSelector(compound.to_string()));
        }
        return Ok(SelectorAttrCondition::Exists {
            key: body.to_ascii_lowercase(),
        });
    };

    let key = key.trim();
    // Operator forms such as ^= or ~= leave their symbol on the key
    // side and are rejected here.
    if key.is_empty() || !key.chars().all(is_selector_ident_char) {
        return Err(Error::UnsupportedSelector(compound.to_string()));
    }

    let mut value = value.trim();
    if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
        || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
    {
        value = &value[1..value.len() - 1];
    }

    Ok(SelectorAttrCondition::Eq {
        key: key.to_ascii_lowercase(),
        value: value.to_string(),
    })
}

fn read_selector_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && is_selector_ident_char(chars[*i]) {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

fn is_selector_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

/// Returns the bare id when the whole selector is a single `#id` group,
/// letting lookups go straight through the id index.
pub(crate) fn id_only(groups: &[Vec<SelectorPart>]) -> Option<&str> {
    let [group] = groups else {
        return None;
    };
    let [part] = group.as_slice() else {
        return None;
    };
    let step = &part.step;
    if step.tag.is_none() && !step.universal && step.classes.is_empty() && step.attrs.is_empty() {
        step.id.as_deref()
    } else {
        None
    }
}

fn matches_step(dom: &Dom, node: NodeId, step: &SelectorStep) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };
    if let Some(tag) = &step.tag {
        if !element.tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &step.id {
        if dom.id_of(node).as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    for class_name in &step.classes {
        if !has_class(element, class_name) {
            return false;
        }
    }
    for condition in &step.attrs {
        match condition {
            SelectorAttrCondition::Exists { key } => {
                if !element.attrs.contains_key(key) {
                    return false;
                }
            }
            SelectorAttrCondition::Eq { key, value } => {
                if element.attrs.get(key) != Some(value) {
                    return false;
                }
            }
        }
    }
    true
}

fn matches_chain(dom: &Dom, node: NodeId, parts: &[SelectorPart]) -> bool {
    matches_from(dom, node, parts, parts.len() - 1)
}

fn matches_from(dom: &Dom, node: NodeId, parts: &[SelectorPart], index: usize) -> bool {
    if !matches_step(dom, node, &parts[index].step) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match parts[index].combinator {
        SelectorCombinator::Child => dom
            .parent(node)
            .is_some_and(|parent| matches_from(dom, parent, parts, index - 1)),
        SelectorCombinator::Descendant => {
            let mut ancestor = dom.parent(node);
            while let Some(current) = ancestor {
                if matches_from(dom, current, parts, index - 1) {
                    return true;
                }
                ancestor = dom.parent(current);
            }
            false
        }
    }
}

pub(crate) fn query_selector(dom: &Dom, selector: &str) -> Result<Option<NodeId>> {
    let groups = parse_selector_groups(selector)?;
    if let Some(id) = id_only(&groups) {
        return Ok(dom.by_id(id));
    }
    for node in dom.all_elements() {
        if groups.iter().any(|group| matches_chain(dom, node, group)) {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

pub(crate) fn query_selector_all(dom: &Dom, selector: &str) -> Result<Vec<NodeId>> {
    let groups = parse_selector_groups(selector)?;
    Ok(dom
        .all_elements()
        .into_iter()
        .filter(|node| groups.iter().any(|group| matches_chain(dom, *node, group)))
        .collect())
}

pub(crate) fn query_selector_from(
    dom: &Dom,
    root: NodeId,
    selector: &str,
) -> Result<Option<NodeId>> {
    let groups = parse_selector_groups(selector)?;
    for node in dom.descendant_elements(root) {
        if groups.iter().any(|group| matches_chain(dom, node, group)) {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

pub(crate) fn closest(dom: &Dom, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
    let groups = parse_selector_groups(selector)?;
    let mut current = Some(node);
    while let Some(candidate) = current {
        if dom.element(candidate).is_some()
            && groups
                .iter()
                .any(|group| matches_chain(dom, candidate, group))
        {
            return Ok(Some(candidate));
        }
        current = dom.parent(candidate);
    }
    Ok(None)
}
