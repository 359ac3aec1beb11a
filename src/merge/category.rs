use std::collections::BTreeSet;
use std::fmt;

use crate::naming::handler_method_name;
use crate::spec::ApiSpec;

/// Which handler trait a method belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerCategory {
    Tool,
    Resource,
    ResourceTemplate,
    Prompt,
}

impl HandlerCategory {
    pub const ALL: [HandlerCategory; 4] = [
        HandlerCategory::Tool,
        HandlerCategory::Resource,
        HandlerCategory::ResourceTemplate,
        HandlerCategory::Prompt,
    ];

    /// Name of the generated trait.
    pub fn trait_name(self) -> &'static str {
        match self {
            HandlerCategory::Tool => "ToolHandlers",
            HandlerCategory::Resource => "ResourceHandlers",
            HandlerCategory::ResourceTemplate => "ResourceTemplateHandlers",
            HandlerCategory::Prompt => "PromptHandlers",
        }
    }

    pub fn from_trait_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.trait_name() == name)
    }

    /// Tag used in the orphaned-handler section.
    pub fn slug(self) -> &'static str {
        match self {
            HandlerCategory::Tool => "tool",
            HandlerCategory::Resource => "resource",
            HandlerCategory::ResourceTemplate => "resource_template",
            HandlerCategory::Prompt => "prompt",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

impl fmt::Display for HandlerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandlerCategory::Tool => "tool",
            HandlerCategory::Resource => "resource",
            HandlerCategory::ResourceTemplate => "resource template",
            HandlerCategory::Prompt => "prompt",
        })
    }
}

/// Identity of a handler method: its trait and its method name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId {
    pub category: HandlerCategory,
    pub name: String,
}

impl HandlerId {
    pub fn new(category: HandlerCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} handler `{}`", self.category, self.name)
    }
}

/// Handler methods the current API description calls for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredHandlers(BTreeSet<HandlerId>);

impl RequiredHandlers {
    pub fn from_spec(spec: &ApiSpec) -> Self {
        let tools = spec
            .tools
            .iter()
            .map(|t| HandlerId::new(HandlerCategory::Tool, handler_method_name(&t.name)));
        let resources = spec.resources.iter().map(|r| {
            let category = if r.is_template() {
                HandlerCategory::ResourceTemplate
            } else {
                HandlerCategory::Resource
            };
            HandlerId::new(category, handler_method_name(&r.name))
        });
        let prompts = spec
            .prompts
            .iter()
            .map(|p| HandlerId::new(HandlerCategory::Prompt, handler_method_name(&p.name)));
        Self(tools.chain(resources).chain(prompts).collect())
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<HandlerId> for RequiredHandlers {
    fn from_iter<I: IntoIterator<Item = HandlerId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
