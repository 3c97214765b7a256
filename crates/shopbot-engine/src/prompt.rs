use minijinja::{AutoEscape, Environment, context};

use shopbot_core::{Result, ShopError};
use shopbot_functions::StoreInfo;

/// Renders the system prompt template.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    pub fn render(&self, template: &str, store: &StoreInfo, user_id: &str) -> Result<String> {
        let tmpl = self
            .env
            .template_from_str(template)
            .map_err(|e| ShopError::Template(e.to_string()))?;

        let rendered = tmpl
            .render(context! { store => store, user_id => user_id })
            .map_err(|e| ShopError::Template(e.to_string()))?;
        Ok(rendered.trim().to_string())
    }
}
