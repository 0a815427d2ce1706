//! YAML emission
//!
//! Output is fully determined by the ordered set: struct fields are written
//! in declaration order, maps in key order, and yaml-rust2's emitter quotes a
//! scalar whenever it would otherwise read back as another type.

use kiln_common::yaml::DOCUMENT_SEPARATOR;
use serde::Serialize;

use crate::resource::OrderedResourceSet;
use crate::Result;

/// One file of a kustomize directory layout
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedFile {
    /// File name, e.g. `deployment.yaml`
    pub file_name: String,
    /// YAML content
    pub content: String,
}

/// Emit the set as one `---`-separated YAML stream
pub fn emit(set: &OrderedResourceSet) -> Result<String> {
    let documents = set
        .iter()
        .map(|r| r.manifest().to_yaml())
        .collect::<Result<Vec<_>>>()?;
    Ok(documents.join(DOCUMENT_SEPARATOR))
}

/// Emit the set as one file per kind. Several resources of the same kind
/// share a file as a multi-document stream.
pub fn emit_files(set: &OrderedResourceSet) -> Result<Vec<EmittedFile>> {
    let mut files: Vec<(&'static str, Vec<String>)> = Vec::new();
    for resource in set.iter() {
        let document = resource.manifest().to_yaml()?;
        let file_name = resource.kind().file_name();
        match files.iter_mut().find(|(name, _)| *name == file_name) {
            Some((_, documents)) => documents.push(document),
            None => files.push((file_name, vec![document])),
        }
    }
    Ok(files
        .into_iter()
        .map(|(file_name, documents)| EmittedFile {
            file_name: file_name.to_string(),
            content: documents.join(DOCUMENT_SEPARATOR),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::TemplateExpander;
    use crate::kind::ResourceKind;
    use crate::order::order;
    use crate::params::{ParamValue, ParameterSet};
    use crate::resource::ResourceSet;
    use crate::validate::Validator;
    use kiln_common::parse_yaml_multi;

    fn ordered(params: &ParameterSet) -> OrderedResourceSet {
        let set = TemplateExpander::new(params)
            .unwrap()
            .with_scope(&[
                ResourceKind::Namespace,
                ResourceKind::ConfigMap,
                ResourceKind::PersistentVolumeClaim,
                ResourceKind::Deployment,
                ResourceKind::Service,
                ResourceKind::Kustomization,
            ])
            .expand_all()
            .unwrap();
        order(Validator::default().check(set).unwrap())
    }

    fn params() -> ParameterSet {
        ParameterSet::from_pairs([
            ("app-name", ParamValue::from("n8n")),
            ("image", ParamValue::from("docker.n8n.io/n8nio/n8n:1.118.2")),
            ("port", ParamValue::from(3008)),
            ("storage-size", ParamValue::from("1Gi")),
            ("env.N8N_PORT", ParamValue::from(3008)),
            ("env.N8N_SECURE_COOKIE", ParamValue::from(false)),
        ])
        .unwrap()
    }

    // =========================================================================
    // Story: Stream Output
    // =========================================================================

    #[test]
    fn story_stream_has_one_document_per_resource() {
        let set = ordered(&params());
        let yaml = emit(&set).unwrap();
        assert!(yaml.starts_with("apiVersion: v1\nkind: Namespace\n"));
        assert_eq!(yaml.matches("---\n").count(), set.len() - 1);
    }

    #[test]
    fn story_emitted_yaml_parses_back_to_the_same_documents() {
        let set = ordered(&params());
        let yaml = emit(&set).unwrap();
        let parsed = parse_yaml_multi(&yaml).unwrap();
        let expected: Vec<_> = set.iter().map(|r| r.manifest().to_value().unwrap()).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn story_string_values_that_look_typed_are_quoted() {
        let yaml = emit(&ordered(&params())).unwrap();
        assert!(yaml.contains("N8N_PORT: \"3008\"\n"));
        assert!(yaml.contains("N8N_SECURE_COOKIE: \"false\"\n"));
        assert!(yaml.contains("containerPort: 3008\n"));
    }

    #[test]
    fn story_float_words_stay_strings() {
        let p = params()
            .with("env.LIMIT", ".inf")
            .unwrap()
            .with("env.FLOOR", "-.inf")
            .unwrap()
            .with("env.RATIO", ".nan")
            .unwrap();
        let yaml = emit(&ordered(&p)).unwrap();
        assert!(yaml.contains("LIMIT: \".inf\"\n"));

        let documents = parse_yaml_multi(&yaml).unwrap();
        let data = &documents[1]["data"];
        assert_eq!(data["LIMIT"], ".inf");
        assert_eq!(data["FLOOR"], "-.inf");
        assert_eq!(data["RATIO"], ".nan");
    }

    #[test]
    fn story_emission_is_deterministic() {
        let first = emit(&ordered(&params())).unwrap();
        let second = emit(&ordered(&params())).unwrap();
        assert_eq!(first, second);
    }

    // =========================================================================
    // Story: Directory Layout
    // =========================================================================

    #[test]
    fn story_one_file_per_kind() {
        let files = emit_files(&ordered(&params())).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "namespace.yaml",
                "configmap.yaml",
                "pvc.yaml",
                "deployment.yaml",
                "service.yaml",
                "kustomization.yaml"
            ]
        );
        assert!(files.iter().all(|f| !f.content.contains("---")));
    }

    #[test]
    fn story_same_kind_shares_a_file() {
        let p = params();
        let staging = ParameterSet::from_pairs([("namespace", "staging")]).unwrap();
        let mut set = ResourceSet::new();
        set.push(TemplateExpander::new(&p).unwrap().expand(ResourceKind::Namespace).unwrap());
        set.push(
            TemplateExpander::new(&staging)
                .unwrap()
                .expand(ResourceKind::Namespace)
                .unwrap(),
        );

        let files = emit_files(&order(Validator::default().check(set).unwrap())).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content.matches("kind: Namespace").count(), 2);
        assert!(files[0].content.contains("---\n"));
    }
}
