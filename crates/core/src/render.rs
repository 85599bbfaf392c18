// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering of a message into its display form

use std::sync::Arc;

use minijinja::{context, AutoEscape, Environment};
use thiserror::Error;

use crate::message::MessageId;

/// Markup used when no template is configured
pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    r#"<div class="message" id="m{{ id }}">{{ body }}</div>"#;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid message template: {0}")]
    InvalidTemplate(#[source] minijinja::Error),
    #[error("failed to render message {id}: {source}")]
    Failed {
        id: MessageId,
        #[source]
        source: minijinja::Error,
    },
}

/// Produces the pre-computed display form stored with each message
pub trait Renderer: Clone + Send + Sync + 'static {
    fn render(&self, id: &MessageId, body: &str) -> Result<String, RenderError>;
}

/// Renders messages through a minijinja template with HTML auto-escaping.
///
/// The template sees two variables: `id` and `body`.
#[derive(Clone)]
pub struct TemplateRenderer {
    env: Arc<Environment<'static>>,
    source: Arc<str>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            env: Arc::new(html_environment()),
            source: Arc::from(DEFAULT_MESSAGE_TEMPLATE),
        }
    }

    /// Use a custom template, rejecting it up front if it does not parse
    pub fn with_template(source: impl Into<String>) -> Result<Self, RenderError> {
        let source: String = source.into();
        let env = html_environment();
        env.template_from_str(&source)
            .map_err(RenderError::InvalidTemplate)?;

        Ok(Self {
            env: Arc::new(env),
            source: Arc::from(source),
        })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, id: &MessageId, body: &str) -> Result<String, RenderError> {
        self.env
            .render_str(&self.source, context! { id => id.as_str(), body => body })
            .map_err(|source| RenderError::Failed {
                id: id.clone(),
                source,
            })
    }
}

fn html_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
