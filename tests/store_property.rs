mod common;

use std::sync::Arc;

use proptest::prelude::*;

use common::{MockCatalog, test_config, wave_graph};
use francolino::model::{EdgeSpec, NodePatch};
use francolino::store::GraphStore;

#[derive(Clone, Debug)]
enum Op {
    AddNode(String),
    AddEdge(usize, usize),
    Remove(usize),
    Recolor(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::string::string_regex("[A-Z][a-z]{0,8}")
            .unwrap()
            .prop_map(Op::AddNode),
        (0usize..16, 0usize..16).prop_map(|(a, b)| Op::AddEdge(a, b)),
        (0usize..16).prop_map(Op::Remove),
        (0usize..16).prop_map(Op::Recolor),
    ]
}

/// Apply `op` to the store. Returns whether a history entry was
/// pushed (ops whose preconditions fail are skipped entirely;
/// rejected edges still snapshot before validating).
async fn apply(store: &mut GraphStore, op: &Op) -> bool {
    match op {
        Op::AddNode(label) => {
            store
                .add_node(NodePatch::new().with_label(label.clone()), Some(label))
                .await;
            true
        }
        Op::AddEdge(a, b) => {
            let doc = store.snapshot();
            if doc.nodes.is_empty() {
                return false;
            }
            let source = doc.nodes[a % doc.nodes.len()].id.clone();
            let target = doc.nodes[b % doc.nodes.len()].id.clone();
            let _ = store.add_edge(EdgeSpec::new(source, target));
            true
        }
        Op::Remove(index) => {
            let doc = store.snapshot();
            if doc.nodes.is_empty() {
                return false;
            }
            let id = doc.nodes[index % doc.nodes.len()].id.clone();
            store.remove_elements(&[id]);
            true
        }
        Op::Recolor(index) => {
            let doc = store.snapshot();
            if doc.nodes.is_empty() {
                return false;
            }
            let id = doc.nodes[index % doc.nodes.len()].id.clone();
            store.update_node(&id, NodePatch::new().with_color("#123456"));
            true
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn n_mutations_then_n_undos_is_identity(ops in prop::collection::vec(op_strategy(), 1..10)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let mut store = GraphStore::new(Arc::new(MockCatalog::default()), &test_config());
            store.load(wave_graph());
            let baseline = store.snapshot();

            let mut recorded = 0usize;
            for op in &ops {
                if apply(&mut store, op).await {
                    recorded += 1;
                }
            }
            for _ in 0..recorded {
                store.undo();
            }
            prop_assert_eq!(store.snapshot(), baseline);
            Ok(())
        })?;
    }

    #[test]
    fn undo_then_redo_is_identity(ops in prop::collection::vec(op_strategy(), 1..8)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let mut store = GraphStore::new(Arc::new(MockCatalog::default()), &test_config());
            store.load(wave_graph());
            for op in &ops {
                apply(&mut store, op).await;
            }

            let latest = store.snapshot();
            store.undo();
            store.redo();
            prop_assert_eq!(store.snapshot(), latest);
            Ok(())
        })?;
    }
}
