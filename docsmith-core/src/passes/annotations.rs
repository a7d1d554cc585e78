//! Moves trailing `{{ ... }}` annotations into element properties.

use super::Pass;
use crate::mdx::annotation::split_annotation;
use crate::pipeline::PipelineError;
use crate::tree::{NodeKind, Tree};
use serde_json::Value;

/// Strip annotation literals from element text and store them as the
/// element's `annotation` property. Returns the number of elements annotated.
pub fn annotate(tree: &mut Tree) -> Result<usize, PipelineError> {
    let mut count = 0;

    for id in tree.walk() {
        let node = tree.node(id);
        // Code spans and blocks hold literal source
        if node.kind != NodeKind::Element || node.is_element("code") {
            continue;
        }
        let Some(&last) = node.children().last() else {
            continue;
        };
        let last_node = tree.node(last);
        if last_node.kind != NodeKind::Text {
            continue;
        }
        let text = last_node.value.as_deref().unwrap_or("");

        let split = split_annotation(text).map_err(|source| PipelineError::Annotation {
            tag: node.tag.clone().unwrap_or_default(),
            source,
        })?;

        if let Some((remaining, annotation)) = split {
            tree.node_mut(last).value = Some(remaining);
            tree.node_mut(id)
                .set_prop("annotation", Value::Object(annotation));
            count += 1;
        }
    }

    Ok(count)
}

pub struct AnnotationPass;

impl Pass for AnnotationPass {
    fn name(&self) -> &'static str {
        "annotations"
    }

    fn run(&mut self, tree: &mut Tree) -> Result<(), PipelineError> {
        let count = annotate(tree)?;
        tracing::debug!("Annotated {} elements", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdx::parse_mdx;
    use serde_json::json;

    #[test]
    fn test_heading_annotation() {
        let mut tree = parse_mdx("## Create item {{ tag: 'POST', label: '/v1/items' }}\n");
        assert_eq!(annotate(&mut tree).unwrap(), 1);

        let h2 = tree.find_first("h2").unwrap();
        assert_eq!(tree.text_content(h2), "Create item");
        assert_eq!(
            tree.node(h2).prop("annotation"),
            Some(&json!({ "tag": "POST", "label": "/v1/items" }))
        );
    }

    #[test]
    fn test_paragraph_annotation() {
        let mut tree = parse_mdx("Some text {{ className: 'lead' }}\n");
        annotate(&mut tree).unwrap();

        let p = tree.find_first("p").unwrap();
        assert_eq!(tree.node(p).prop("annotation"), Some(&json!({ "className": "lead" })));
    }

    #[test]
    fn test_no_annotation_leaves_tree_alone() {
        let mut tree = parse_mdx("## Plain\n");
        assert_eq!(annotate(&mut tree).unwrap(), 0);
        let h2 = tree.find_first("h2").unwrap();
        assert!(tree.node(h2).prop("annotation").is_none());
    }

    #[test]
    fn test_code_left_literal() {
        let mut tree = parse_mdx("Write `{{ ... }}` after a heading.\n\n```js\nconst x = {{ a: 1 }}\n```\n");
        assert_eq!(annotate(&mut tree).unwrap(), 0);
    }

    #[test]
    fn test_malformed_annotation_fails() {
        let mut tree = parse_mdx("## Bad {{ tag: GET }}\n");
        let err = annotate(&mut tree).unwrap_err();
        assert!(matches!(err, PipelineError::Annotation { ref tag, .. } if tag == "h2"));
    }
}
