//! Material network conversion and material binding containers.
//!
//! A [`MaterialNetworkMap`] becomes
//! `material.<renderContext>.{nodes, terminals}`: each node carries its
//! identifier, parameters and input connections, and each terminal points
//! at the last node of its network.

use crate::core::{
    create_typed_retained, DataSourceHandle, RetainedContainer, RetainedTypedSampled,
    RetainedVector,
};
use crate::legacy::{MaterialNetworkMap, MaterialNode, MaterialRelationship};
use crate::scene::tokens::{material, schema};
use crate::util::{Path, Token};

fn path_token(path: &Path) -> Token {
    Token::new(&path.to_string())
}

fn connection(upstream: &Path, output_name: &Token) -> DataSourceHandle {
    RetainedContainer::handle([
        (
            material::UPSTREAM_NODE_PATH,
            Some(RetainedTypedSampled::handle(path_token(upstream))),
        ),
        (
            material::UPSTREAM_NODE_OUTPUT_NAME,
            Some(RetainedTypedSampled::handle(output_name.clone())),
        ),
    ])
}

/// Container of one shading node.
///
/// `relationships` may hold connections of the whole network; only those
/// feeding `node` are kept.
pub fn node_container(
    node: &MaterialNode,
    relationships: &[MaterialRelationship],
) -> DataSourceHandle {
    let parameters = RetainedContainer::handle(node.parameters.iter().map(|(name, value)| {
        let param = RetainedContainer::handle([(
            material::VALUE,
            Some(create_typed_retained(value.clone())),
        )]);
        (name.clone(), Some(param))
    }));

    // Connections grouped by downstream input, in first-seen order.
    let mut inputs: Vec<(Token, Vec<Option<DataSourceHandle>>)> = Vec::new();
    for rel in relationships.iter().filter(|r| r.output_id == node.path) {
        let conn = Some(connection(&rel.input_id, &rel.input_name));
        match inputs.iter_mut().find(|(name, _)| *name == rel.output_name) {
            Some((_, conns)) => conns.push(conn),
            None => inputs.push((rel.output_name.clone(), vec![conn])),
        }
    }
    let input_connections = RetainedContainer::handle(
        inputs
            .into_iter()
            .map(|(name, conns)| (name, Some(RetainedVector::handle(conns)))),
    );

    RetainedContainer::handle([
        (
            material::NODE_IDENTIFIER,
            Some(RetainedTypedSampled::handle(node.identifier.clone())),
        ),
        (material::PARAMETERS, Some(parameters)),
        (material::INPUT_CONNECTIONS, Some(input_connections)),
    ])
}

/// `material` container converted from a legacy network map.
pub fn material_container(map: &MaterialNetworkMap) -> DataSourceHandle {
    let mut nodes: Vec<(Token, Option<DataSourceHandle>)> = Vec::new();
    let mut terminals: Vec<(Token, Option<DataSourceHandle>)> = Vec::new();

    for (terminal_name, network) in &map.map {
        for node in &network.nodes {
            let name = path_token(&node.path);
            if nodes.iter().any(|(n, _)| *n == name) {
                continue;
            }
            nodes.push((name, Some(node_container(node, &network.relationships))));
        }
        if let Some(terminal_node) = network.nodes.last() {
            terminals.push((
                terminal_name.clone(),
                Some(connection(&terminal_node.path, terminal_name)),
            ));
        }
    }

    let network = RetainedContainer::handle([
        (material::NODES, Some(RetainedContainer::handle(nodes))),
        (material::TERMINALS, Some(RetainedContainer::handle(terminals))),
    ]);
    RetainedContainer::handle([(material::UNIVERSAL_RENDER_CONTEXT, Some(network))])
}

/// `materialBindings` with the all-purpose binding, `None` without a
/// material.
pub fn material_bindings(material_id: Path) -> Option<DataSourceHandle> {
    if material_id.is_empty() {
        return None;
    }
    let binding = RetainedContainer::handle([(
        schema::MATERIAL_BINDING_PATH,
        Some(RetainedTypedSampled::handle(material_id)),
    )]);
    Some(RetainedContainer::handle([(schema::ALL_PURPOSE, Some(binding))]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{container_get, sampled_at, Locator, Value};
    use crate::legacy::MaterialNetwork;
    use std::collections::BTreeMap;

    fn p(text: &str) -> Path {
        Path::parse(text).unwrap()
    }

    fn network() -> MaterialNetworkMap {
        let mut params = BTreeMap::new();
        params.insert(Token::new("roughness"), Value::Float(0.25));
        let texture = MaterialNode {
            path: p("/mat/tex"),
            identifier: Token::new("UsdUVTexture"),
            parameters: BTreeMap::new(),
        };
        let surface = MaterialNode {
            path: p("/mat/surface"),
            identifier: Token::new("UsdPreviewSurface"),
            parameters: params,
        };
        let mut map = BTreeMap::new();
        map.insert(
            Token::new("surface"),
            MaterialNetwork {
                nodes: vec![texture, surface],
                relationships: vec![MaterialRelationship {
                    input_id: p("/mat/tex"),
                    input_name: Token::new("rgb"),
                    output_id: p("/mat/surface"),
                    output_name: Token::new("diffuseColor"),
                }],
                primvars: Vec::new(),
            },
        );
        MaterialNetworkMap {
            map,
            terminals: vec![p("/mat/surface")],
        }
    }

    #[test]
    fn test_material_network_conversion() {
        let ds = material_container(&network());
        let c = ds.as_container().unwrap();
        let nodes = Locator::new([material::UNIVERSAL_RENDER_CONTEXT, material::NODES]);
        let surface = nodes.append(&Token::new("/mat/surface"));

        let ident = container_get(c, &surface.append(&material::NODE_IDENTIFIER)).unwrap();
        assert_eq!(
            ident.as_sampled().unwrap().typed_value::<Token>(0.0),
            "UsdPreviewSurface"
        );
        let roughness = surface
            .append(&material::PARAMETERS)
            .append(&Token::new("roughness"))
            .append(&material::VALUE);
        assert_eq!(
            sampled_at(c, &roughness).unwrap().typed_value::<f32>(0.0),
            0.25
        );

        let conns = container_get(
            c,
            &surface
                .append(&material::INPUT_CONNECTIONS)
                .append(&Token::new("diffuseColor")),
        )
        .unwrap();
        let conn = conns.as_vector().unwrap().element(0).unwrap().into_container().unwrap();
        let upstream = conn.get(&material::UPSTREAM_NODE_PATH).unwrap();
        assert_eq!(upstream.as_sampled().unwrap().typed_value::<Token>(0.0), "/mat/tex");

        let terminal = Locator::new([
            material::UNIVERSAL_RENDER_CONTEXT,
            material::TERMINALS,
            Token::new("surface"),
            material::UPSTREAM_NODE_PATH,
        ]);
        assert_eq!(
            sampled_at(c, &terminal).unwrap().typed_value::<Token>(0.0),
            "/mat/surface"
        );
    }

    #[test]
    fn test_material_bindings() {
        assert!(material_bindings(Path::empty()).is_none());
        let ds = material_bindings(p("/mat")).unwrap();
        let locator = Locator::new([schema::ALL_PURPOSE, schema::MATERIAL_BINDING_PATH]);
        let path = sampled_at(ds.as_container().unwrap(), &locator).unwrap();
        assert_eq!(path.typed_value::<Path>(0.0), p("/mat"));
    }
}
