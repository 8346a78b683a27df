//! Robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate. `Crawl-delay`
//! is not part of that crate's API, so it is read here from the record groups.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data for one host
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty means allow all)
    content: String,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// A permissive set of rules, used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Returns true if these rules allow everything
    pub fn is_allow_all(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Checks if `url` may be fetched by the crawler named `agent`
    ///
    /// `url` may be an absolute URL or a path; `agent` is the product token
    /// (the crawler name without version).
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// Gets the `Crawl-delay` (seconds) that applies to `agent`
    ///
    /// A group naming the agent wins over the `*` group. Consecutive
    /// `User-agent` lines share one group.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        let agent = agent.to_lowercase();

        let mut group_agents: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut specific: Option<f64> = None;
        let mut wildcard: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !in_agent_lines {
                        group_agents.clear();
                        in_agent_lines = true;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_agent_lines = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    for name in &group_agents {
                        if name == "*" {
                            wildcard.get_or_insert(delay);
                        } else if !name.is_empty() && agent.contains(name.as_str()) {
                            specific.get_or_insert(delay);
                        }
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        specific.or(wildcard)
    }
}
