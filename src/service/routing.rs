//! Keyword routing for free-form requests.

/// Maps a keyword to an agent, a workflow, or both. Rules are evaluated in
/// order and the first keyword found in the message wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    pub keyword: String,
    pub agent: Option<String>,
    pub workflow: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentTarget<'a> {
    RunWorkflow(&'a str),
    LoadAgent(&'a str),
}

impl IntentRule {
    pub fn new(keyword: &str, agent: Option<&str>, workflow: Option<&str>) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            agent: agent.map(str::to_string),
            workflow: workflow.map(str::to_string),
        }
    }

    /// With inputs supplied a rule's workflow is run; otherwise its agent is
    /// loaded, falling back to the workflow when the rule names no agent.
    pub fn target(&self, has_inputs: bool) -> Option<IntentTarget<'_>> {
        match (self.workflow.as_deref(), self.agent.as_deref()) {
            (Some(workflow), _) if has_inputs => Some(IntentTarget::RunWorkflow(workflow)),
            (_, Some(agent)) => Some(IntentTarget::LoadAgent(agent)),
            (Some(workflow), None) => Some(IntentTarget::RunWorkflow(workflow)),
            (None, None) => None,
        }
    }
}

pub fn match_intent<'a>(rules: &'a [IntentRule], message: &str) -> Option<&'a IntentRule> {
    let message = message.trim().to_lowercase();
    if message.is_empty() {
        return None;
    }
    rules
        .iter()
        .find(|rule| !rule.keyword.is_empty() && message.contains(&rule.keyword))
}

/// Workflow slug named by a master command such as `/bmad:master *party-mode`.
/// A bare `/bmad:master` names no workflow.
pub fn master_trigger(message: &str) -> Option<&str> {
    let command = message.trim().strip_prefix('/')?;
    let (head, rest) = command
        .split_once(char::is_whitespace)
        .unwrap_or((command, ""));
    let (_, role) = head.split_once(':')?;
    if !role.eq_ignore_ascii_case("master") {
        return None;
    }
    let slug = rest.split_whitespace().next()?.strip_prefix('*')?;
    (!slug.is_empty()).then_some(slug)
}

pub fn default_intent_rules() -> Vec<IntentRule> {
    const TABLE: &[(&str, Option<&str>, Option<&str>)] = &[
        ("plan", Some("pm"), Some("plan-project")),
        ("project", Some("pm"), Some("plan-project")),
        ("prd", Some("pm"), Some("prd")),
        ("requirements", Some("analyst"), None),
        ("architect", Some("architect"), Some("solution-architecture")),
        ("architecture", Some("architect"), Some("solution-architecture")),
        ("tech spec", Some("architect"), Some("tech-spec")),
        ("technical", Some("architect"), None),
        ("implement", Some("dev"), Some("dev-story")),
        ("code", Some("dev"), None),
        ("develop", Some("dev"), Some("dev-story")),
        ("story", Some("sm"), Some("create-story")),
        ("test", Some("tea"), None),
        ("quality", Some("tea"), None),
        ("qa", Some("tea"), None),
        ("ux", Some("ux-expert"), Some("ux-spec")),
        ("user experience", Some("ux-expert"), Some("ux-spec")),
        ("ui", Some("ux-expert"), None),
        ("design", Some("ux-expert"), None),
        ("game", Some("game-designer"), Some("gdd")),
        ("gdd", Some("game-designer"), Some("gdd")),
        ("gameplay", Some("game-designer"), None),
        ("game design", Some("game-designer"), Some("gdd")),
        ("brainstorm", None, Some("brainstorming")),
        ("ideate", None, Some("brainstorming")),
        ("ideas", None, Some("brainstorming")),
        ("creative", None, Some("brainstorming")),
        ("research", Some("analyst"), Some("research")),
        ("analyze", Some("analyst"), None),
        ("market", Some("analyst"), Some("research")),
        ("competitive", Some("analyst"), Some("research")),
    ];
    TABLE
        .iter()
        .map(|(keyword, agent, workflow)| IntentRule::new(keyword, *agent, *workflow))
        .collect()
}
