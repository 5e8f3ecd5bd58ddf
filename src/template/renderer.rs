//! Compiled template paired with the shared layout

use std::collections::BTreeMap;
use std::fmt::Write;

use minijinja::{
    escape_formatter, AutoEscape, Environment, Error, ErrorKind, Output, State,
    UndefinedBehavior, Value,
};

use super::context::RenderContext;
use super::types::{TemplateError, TemplateResult};

const CONTENT: &str = "content.html";
const LAYOUT: &str = "layout.html";

/// Variable name of the layout slot that receives the rendered content
pub const BODY_SLOT: &str = "body";

/// A template body and its layout compiled into a single renderer.
///
/// Rendering first evaluates the template body against the context, then
/// evaluates the layout with the same context and the rendered body in
/// the `body` slot. Undefined variables render as empty strings, and
/// string output in HTML templates escapes `& < > " '` only.
pub struct Renderer {
    name: String,
    env: Environment<'static>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").field("name", &self.name).finish()
    }
}

impl Renderer {
    /// Compile a template body, its layout, and the partials it may include.
    ///
    /// Partials are registered under their given names (for example
    /// `partials/footer.html`). Every literal `include`, `extends`,
    /// `import` or `from` target must name a registered template, so a
    /// missing partial is reported here rather than on the first send.
    pub fn compile(
        name: &str,
        body: String,
        layout: String,
        partials: Vec<(String, String)>,
    ) -> TemplateResult<Self> {
        let compile_error = |e: Error| TemplateError::Compile {
            name: name.to_string(),
            detail: e.to_string(),
        };

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_formatter(html_formatter);

        let sources = partials
            .into_iter()
            .chain([(CONTENT.to_string(), body), (LAYOUT.to_string(), layout)]);

        let mut references = Vec::new();
        for (template, source) in sources {
            for target in referenced_templates(&source) {
                references.push((template.clone(), target));
            }
            env.add_template_owned(template, source)
                .map_err(compile_error)?;
        }

        for (template, target) in references {
            if env.get_template(&target).is_err() {
                return Err(TemplateError::Compile {
                    name: name.to_string(),
                    detail: format!("{} includes unknown template {:?}", template, target),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            env,
        })
    }

    /// Render the template inside its layout
    pub fn render(&self, context: &RenderContext) -> TemplateResult<String> {
        self.render_inner(context)
            .map_err(|e| TemplateError::Render {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }

    fn render_inner(&self, context: &RenderContext) -> Result<String, Error> {
        let content = self.env.get_template(CONTENT)?.render(context)?;

        let mut vars: BTreeMap<String, Value> = context
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
            .collect();
        vars.insert(BODY_SLOT.to_string(), Value::from_safe_string(content));

        self.env.get_template(LAYOUT)?.render(Value::from(vars))
    }
}

/// Writes strings escaped for HTML, leaving `/` as is. Everything else
/// goes through the default formatter.
fn html_formatter(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> Result<(), Error> {
    let text = match value.as_str() {
        Some(text) if matches!(state.auto_escape(), AutoEscape::Html) && !value.is_safe() => text,
        _ => return escape_formatter(out, state, value),
    };

    for c in text.chars() {
        match c {
            '&' => out.write_str("&amp;"),
            '<' => out.write_str("&lt;"),
            '>' => out.write_str("&gt;"),
            '"' => out.write_str("&quot;"),
            '\'' => out.write_str("&#39;"),
            c => out.write_char(c),
        }
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write template output"))?;
    }
    Ok(())
}

/// Template names referenced by tags with a string literal target.
///
/// Dynamic targets and `ignore missing` includes are skipped; content
/// between `raw` and `endraw` is not scanned.
fn referenced_templates(source: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut in_raw = false;
    let mut rest = source;

    while let Some(start) = rest.find("{%") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("%}") else {
            break;
        };
        let tag = after[..end].trim_matches(|c: char| c == '-' || c == '+' || c.is_whitespace());
        rest = &after[end + 2..];

        match tag {
            "raw" => in_raw = true,
            "endraw" => in_raw = false,
            _ if in_raw => {}
            _ => targets.extend(literal_target(tag)),
        }
    }

    targets
}

fn literal_target(tag: &str) -> Option<String> {
    let (keyword, args) = tag.split_once(char::is_whitespace)?;
    if !matches!(keyword, "include" | "extends" | "import" | "from")
        || args.contains("ignore missing")
    {
        return None;
    }

    let args = args.trim_start();
    let quote = args.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let literal = &args[1..];
    let end = literal.find(quote)?;
    Some(literal[..end].to_string())
}
