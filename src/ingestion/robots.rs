//! robots.txt exclusion rules

use url::Url;

/// Allow/disallow rules that apply to this crawler's user agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    allow: bool,
    pattern: String,
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

impl RobotsRules {
    /// Rules that allow every path
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parse a robots.txt body, keeping only the group that applies to
    /// `user_agent`. A group naming the agent's product token wins over `*`.
    pub fn parse(body: &str, user_agent: &str) -> Self {
        let product = user_agent
            .split('/')
            .next()
            .unwrap_or(user_agent)
            .trim()
            .to_ascii_lowercase();

        let mut groups: Vec<Group> = Vec::new();
        let mut collecting_agents = false;

        for raw_line in body.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !collecting_agents {
                        groups.push(Group::default());
                        collecting_agents = true;
                    }
                    // An empty agent token names no crawler
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    collecting_agents = false;
                    // An empty Disallow means "allow everything"
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.rules.push(Rule {
                            allow: key == "allow",
                            pattern: value.to_string(),
                        });
                    }
                }
                _ => collecting_agents = false,
            }
        }

        let specific: Vec<Rule> = groups
            .iter()
            .filter(|g| {
                g.agents
                    .iter()
                    .any(|a| a != "*" && !product.is_empty() && product.contains(a.as_str()))
            })
            .flat_map(|g| g.rules.iter().cloned())
            .collect();

        let rules = if !specific.is_empty() {
            specific
        } else {
            groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .flat_map(|g| g.rules.iter().cloned())
                .collect()
        };

        Self { rules }
    }

    /// Whether `url` may be fetched. The longest matching pattern decides;
    /// on a tie, allow wins.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let mut best: Option<(usize, bool)> = None;
        for rule in &self.rules {
            if !pattern_matches(&rule.pattern, &target) {
                continue;
            }
            let len = rule.pattern.len();
            best = match best {
                Some((best_len, best_allow))
                    if best_len > len || (best_len == len && best_allow) =>
                {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.allow)),
            };
        }

        best.map(|(_, allow)| allow).unwrap_or(true)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Prefix match supporting `*` wildcards and a trailing `$` anchor
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut position = 0usize;

    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            if !path.starts_with(part) {
                return false;
            }
            position = part.len();
            continue;
        }
        if part.is_empty() {
            continue;
        }
        if anchored && i == parts.len() - 1 {
            return path.len() >= position + part.len() && path.ends_with(part);
        }
        match path[position..].find(part) {
            Some(offset) => position += offset + part.len(),
            None => return false,
        }
    }

    if anchored {
        // With a trailing wildcard before `$` any remainder is fine
        parts.last().is_some_and(|p| p.is_empty() && parts.len() > 1) || position == path.len()
    } else {
        true
    }
}
