use anyhow::Result;
use utoipa::OpenApi;

use crate::schemas::ApiDoc;

pub fn print_openapi(yaml: bool) -> Result<()> {
    let document = render_openapi(yaml)?;
    println!("{}", document);
    Ok(())
}

fn render_openapi(yaml: bool) -> Result<String> {
    let openapi = ApiDoc::openapi();
    let document = if yaml {
        serde_yaml::to_string(&openapi)?
    } else {
        serde_json::to_string_pretty(&openapi)?
    };
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json_and_yaml() {
        let json = render_openapi(false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["paths"]["/api/transactions"].is_object());

        let yaml = render_openapi(true).unwrap();
        assert!(yaml.contains("/api/budgets/{id}/reconcile"));
    }
}
