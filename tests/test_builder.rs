//! Tests for region model construction

use rcc5_risk::builder::{ComponentRegions, RegionModel};
use rcc5_risk::model::{ArchitectureModel, ComponentKind, ROOT};
use rcc5_risk::region::RegionKind;
use rcc5_risk::AnalysisError;

fn sensor_with_sockets() -> ArchitectureModel {
    let mut model = ArchitectureModel::new();
    model
        .agent("s", "sensor")
        .component("in", "cmd", ComponentKind::InputPort, "s")
        .component("sock_in", "cmd socket", ComponentKind::InputSocket, "s")
        .component("f", "sample", ComponentKind::FunctionalBlock, "s")
        .component("sock_out", "reading socket", ComponentKind::OutputSocket, "s")
        .component("out", "reading", ComponentKind::OutputPort, "s")
        .component("db", "calibration", ComponentKind::Base, "s")
        .flow("in", "sock_in")
        .flow("sock_in", "f")
        .flow("db", "f")
        .flow("f", "sock_out")
        .flow("sock_out", "out");
    model
}

#[test]
fn test_region_allocation_per_kind() {
    let rm = RegionModel::build(&sensor_with_sockets()).unwrap();
    let regions = rm.regions();

    let ComponentRegions::Port { assertion, belief, fact, .. } = rm.get("in").unwrap().regions else {
        panic!("input port without port regions");
    };
    assert_eq!(regions.kind(assertion), RegionKind::Assertion);
    assert_eq!(regions.kind(belief), RegionKind::Belief);
    assert_eq!(fact.map(|f| regions.kind(f)), Some(RegionKind::Fact));

    let ComponentRegions::Port { fact, .. } = rm.get("out").unwrap().regions else {
        panic!("output port without port regions");
    };
    assert_eq!(fact, None);

    assert!(matches!(rm.get("sock_in").unwrap().regions, ComponentRegions::Socket { .. }));
    assert!(matches!(rm.get("db").unwrap().regions, ComponentRegions::Base { .. }));
}

#[test]
fn test_flows_chain_through_sockets() {
    let rm = RegionModel::build(&sensor_with_sockets()).unwrap();
    let input = |id: &str| rm.get(id).unwrap().regions.input();
    let output = |id: &str| rm.get(id).unwrap().regions.output();

    assert_eq!(output("in"), input("sock_in"));
    assert_eq!(output("sock_in"), input("f"));
    assert_eq!(output("f"), input("sock_out"));
    assert_eq!(output("sock_out"), input("out"));
    assert_eq!(rm.equalities().len(), 5);

    for eq in rm.equalities() {
        assert_eq!(rm.resolve(eq.replaced), rm.resolve(eq.by));
    }
}

#[test]
fn test_base_source_keeps_target_region() {
    let rm = RegionModel::build(&sensor_with_sockets()).unwrap();
    let db = rm.get("db").unwrap();
    let f = rm.get("f").unwrap();
    assert_eq!(db.regions.output(), f.regions.input());

    let eq = rm.equalities().iter().find(|e| e.source == "db").unwrap();
    assert_eq!(eq.by, f.regions.input().unwrap());
}

#[test]
fn test_pairs_and_parthood() {
    let rm = RegionModel::build(&sensor_with_sockets()).unwrap();
    // in, out: one each; sock_in, f, sock_out: two each
    assert_eq!(rm.pairs().len(), 8);
    for record in rm.pairs() {
        assert!(record.pair.contains(record.lead));
        assert_ne!(record.pair.first(), record.pair.second());
    }

    let agent = rm.get("s").unwrap().agent_regions().unwrap();
    assert!(agent.fact.is_none());
    assert!(agent.facts.is_empty());
    assert_eq!(agent.assertions.len(), 2);

    let root = rm.root().agent_regions().unwrap();
    // in port, two sockets, f and db
    assert_eq!(root.facts.len(), 5);
    for p in rm.parthood() {
        assert_eq!(rm.regions().kind(p.part), rm.regions().kind(p.whole));
    }
}

#[test]
fn test_synthesize_channels() {
    let mut model = ArchitectureModel::new();
    model
        .agent("a", "left")
        .component("o", "out", ComponentKind::OutputPort, "a")
        .agent("b", "right")
        .component("i", "in", ComponentKind::InputPort, "b")
        .component("j", "in2", ComponentKind::InputPort, "b")
        .flow("o", "i")
        .flow("o", "j");

    assert_eq!(model.synthesize_channels(), 2);
    assert_eq!(model.get("oi").unwrap().owner, ROOT);
    assert_eq!(model.get("oj").unwrap().name, "out2in2");
    let edges: Vec<_> = model.edges().collect();
    assert_eq!(edges, vec![("o", "oi"), ("o", "oj"), ("oi", "i"), ("oj", "j")]);

    // already normalized
    assert_eq!(model.synthesize_channels(), 0);
    RegionModel::build(&model).unwrap();
}

#[test]
fn test_structural_errors() {
    let mut agent_flow = ArchitectureModel::new();
    agent_flow
        .agent("a", "x")
        .component("f", "f", ComponentKind::FunctionalBlock, "a")
        .flow("a", "f");
    assert!(matches!(
        RegionModel::build(&agent_flow),
        Err(AnalysisError::UnsupportedFlow { .. })
    ));

    let mut unknown_owner = ArchitectureModel::new();
    unknown_owner.component("f", "f", ComponentKind::FunctionalBlock, "nobody");
    let err = RegionModel::build(&unknown_owner).unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownComponent { ref id, .. } if id == "nobody"));

    let mut root_clash = ArchitectureModel::new();
    root_clash.agent(ROOT, "again");
    assert!(matches!(
        RegionModel::build(&root_clash),
        Err(AnalysisError::DuplicateComponent(_))
    ));
}

#[test]
fn test_malformed_json() {
    let err = ArchitectureModel::from_json(r#"{"components": [{"id": "a", "kind": "wizard"}]}"#).unwrap_err();
    assert!(matches!(err, AnalysisError::Serialization(_)));
}
