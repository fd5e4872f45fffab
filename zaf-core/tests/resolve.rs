use std::collections::HashMap;
use std::sync::Arc;

use zaf_common::{ComponentDescriptor, ComponentRegistry, Requirement, Scope, ZafError};
use zaf_core::dependency::{CallArguments, DependencyGraph, DependencyGraphBuilder, Rejection};

fn build(registry: &ComponentRegistry, root: &Arc<ComponentDescriptor>, scope: &Scope) -> DependencyGraph {
    DependencyGraphBuilder::new(registry)
        .create_dependency_graph(root, scope, &[], CallArguments::default())
        .unwrap()
}

fn candidate_names(graph: &DependencyGraph, argument: &str) -> Vec<String> {
    graph
        .root_requirement(argument)
        .unwrap()
        .candidates()
        .iter()
        .map(|id| graph.candidate(*id).short_name().to_string())
        .collect()
}

fn selected_name(graph: &DependencyGraph, argument: &str) -> String {
    let id = graph.root_node().requirement(argument).unwrap();
    let selected = graph.selected(id).unwrap();
    graph.candidate(selected).short_name().to_string()
}

fn no_fixation() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn sole_candidates_are_selected() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a").with_name("A"));
    registry.register(ComponentDescriptor::new("b").with_name("B"));
    let test = Arc::new(
        ComponentDescriptor::new("test")
            .requires(Requirement::named("a", "A"))
            .requires(Requirement::named("b", "B")),
    );
    let scope = Scope::root("test");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    assert_eq!(selected_name(&graph, "a"), "a");
    assert_eq!(selected_name(&graph, "b"), "b");
}

#[test]
fn capability_filter_beats_priority() {
    let mut registry = ComponentRegistry::new();
    registry.register(
        ComponentDescriptor::new("a_x")
            .with_name("A")
            .with_cans(["can_x"])
            .with_priority(1),
    );
    registry.register(
        ComponentDescriptor::new("a_y")
            .with_name("A")
            .with_cans(["can_y"])
            .with_priority(5),
    );
    let test = Arc::new(
        ComponentDescriptor::new("test").requires(Requirement::named("A", "A").can(["can_x"])),
    );
    let scope = Scope::root("test");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    assert_eq!(candidate_names(&graph, "A"), vec!["a_x"]);
    assert_eq!(selected_name(&graph, "A"), "a_x");
    let rejected = graph.root_requirement("A").unwrap().rejected()[0];
    assert_eq!(
        graph.candidate(rejected).rejection(),
        Some(&Rejection::CansNotFulfilled(vec!["can_x".to_string()]))
    );
}

#[test]
fn filter_removes_candidate_with_missing_capability() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A").with_cans(["1"]));
    registry.register(ComponentDescriptor::new("a2").with_name("A").with_cans(["2"]));
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("a", "A").can(["1"])));
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.remove_not_fulfilled();

    assert_eq!(candidate_names(&graph, "a"), vec!["a1"]);
}

#[test]
fn filter_removes_candidate_whose_requirement_has_no_component() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A"));
    registry.register(
        ComponentDescriptor::new("a2")
            .with_name("A")
            .requires(Requirement::named("not_exists", "DoesNotExist")),
    );
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("a", "A")));
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.remove_not_fulfilled();

    assert_eq!(candidate_names(&graph, "a"), vec!["a1"]);
    let rejected = graph.root_requirement("a").unwrap().rejected()[0];
    assert_eq!(
        graph.candidate(rejected).rejection(),
        Some(&Rejection::UnfulfilledRequirements)
    );
}

#[test]
fn nested_missing_capability_names_both_requirements() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a").with_name("A").with_cans(["can_x"]));
    registry.register(
        ComponentDescriptor::new("b")
            .with_name("B")
            .requires(Requirement::named("a_req", "A").can(["can_z"])),
    );
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("b_req", "B")));
    let scope = Scope::root("test");

    let mut graph = build(&registry, &test, &scope);
    let err = graph.resolve(&scope, &no_fixation()).unwrap_err();

    let msg = match err {
        ZafError::ComponentDependency(msg) => msg,
        other => panic!("expected a dependency error, got {other:?}"),
    };
    assert!(msg.contains("'b_req' with name 'B'"), "{msg}");
    assert!(msg.contains("'a_req' with name 'A'"), "{msg}");
}

#[test]
fn uses_merges_nested_requirement_into_consumer_requirement() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a").with_name("A").with_cans(["2"]));
    registry.register(
        ComponentDescriptor::new("b1")
            .with_name("B")
            .with_cans(["1"])
            .requires(Requirement::named("a", "A").can(["1"])),
    );
    registry.register(
        ComponentDescriptor::new("b2")
            .with_name("B")
            .with_cans(["2"])
            .requires(Requirement::named("a", "A").can(["2"])),
    );
    registry.register(
        ComponentDescriptor::new("c")
            .with_name("C")
            .requires(Requirement::named("b", "B")),
    );
    let test = Arc::new(
        ComponentDescriptor::new("test")
            .requires(Requirement::named("a", "A"))
            .requires(Requirement::named("c", "C").uses(["a"])),
    );
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    let root_a = graph.root_node().requirement("a").unwrap();
    let c = graph.selected(graph.root_node().requirement("c").unwrap()).unwrap();
    let b = graph.selected(graph.child_requirement(c, "b").unwrap()).unwrap();
    assert_eq!(graph.candidate(b).short_name(), "b2");

    let nested_a = graph.child_requirement(b, "a").unwrap();
    assert_eq!(nested_a, root_a);
    assert_eq!(graph.selected(nested_a), graph.selected(root_a));
    let cans: Vec<&str> = graph.requirement(root_a).cans().iter().map(String::as_str).collect();
    assert_eq!(cans, vec!["2"]);
}

#[test]
fn uses_is_passed_down_to_nested_consumers() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A").with_priority(5));
    registry.register(ComponentDescriptor::new("a2").with_name("A").with_cans(["y"]));
    registry.register(
        ComponentDescriptor::new("d")
            .with_name("D")
            .requires(Requirement::named("a", "A").can(["y"])),
    );
    registry.register(
        ComponentDescriptor::new("c")
            .with_name("C")
            .requires(Requirement::named("a", "A"))
            .requires(Requirement::named("d", "D").uses(["a"])),
    );
    let test = Arc::new(
        ComponentDescriptor::new("test")
            .requires(Requirement::named("a", "A"))
            .requires(Requirement::named("c", "C").uses(["a"])),
    );
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    let root_a = graph.root_node().requirement("a").unwrap();
    let c = graph.selected(graph.root_node().requirement("c").unwrap()).unwrap();
    assert_eq!(graph.child_requirement(c, "a"), Some(root_a));
    let d = graph.selected(graph.child_requirement(c, "d").unwrap()).unwrap();
    let deep_a = graph.child_requirement(d, "a").unwrap();
    assert_eq!(deep_a, root_a);

    // The capability demanded two levels down now filters the root choice.
    assert!(graph.requirement(root_a).cans().contains("y"));
    assert_eq!(selected_name(&graph, "a"), "a2");
    assert_eq!(graph.selected(deep_a), graph.selected(root_a));
}

#[test]
fn uses_works_with_direct_components() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("c1").with_name("C").with_cans(["C1"]));
    let c2 = registry.register(ComponentDescriptor::new("c2").with_name("C").with_cans(["C2"]));
    registry.register(
        ComponentDescriptor::new("superc")
            .with_name("SuperC")
            .requires(Requirement::named("c", "C")),
    );
    registry.register(
        ComponentDescriptor::new("masterc")
            .with_name("MasterC")
            .requires(Requirement::named("sc", "SuperC")),
    );
    let test = Arc::new(
        ComponentDescriptor::new("test")
            .requires(Requirement::direct("c", Arc::clone(&c2)))
            .requires(Requirement::named("mc", "MasterC").uses(["c"])),
    );
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    let mc = graph.root_requirement("mc").unwrap().candidates()[0];
    let sc = graph.requirement(graph.child_requirement(mc, "sc").unwrap()).candidates()[0];
    let c = graph.child_requirement(sc, "c").unwrap();
    let chosen = graph.selected(c).unwrap();
    assert!(Arc::ptr_eq(graph.candidate(chosen).component(), &c2));
    assert_eq!(Some(chosen), graph.selected(graph.root_node().requirement("c").unwrap()));
}

#[test]
fn uses_does_not_merge_different_targets() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a").with_name("A"));
    registry.register(ComponentDescriptor::new("other").with_name("Other"));
    registry.register(
        ComponentDescriptor::new("b")
            .with_name("B")
            .requires(Requirement::named("x", "Other")),
    );
    let test = Arc::new(
        ComponentDescriptor::new("test")
            .requires(Requirement::named("a", "A"))
            .requires(Requirement::named("b", "B").uses(["a"])),
    );
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    let b = graph.selected(graph.root_node().requirement("b").unwrap()).unwrap();
    let x = graph.child_requirement(b, "x").unwrap();
    assert_ne!(Some(x), graph.root_node().requirement("a"));
    assert_eq!(graph.candidate(graph.selected(x).unwrap()).short_name(), "other");
}

#[test]
fn filter_removes_component_with_shorter_scope_than_parent() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A").with_scope("long"));
    registry.register(ComponentDescriptor::new("a2").with_name("A").with_scope("short"));
    registry.register(
        ComponentDescriptor::new("b")
            .with_name("B")
            .with_scope("long")
            .requires(Requirement::named("a", "A")),
    );
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("b", "B")));
    let short = Scope::chain(["long", "short"]).unwrap();

    let mut graph = build(&registry, &test, &short);
    graph.select_scopes(&short);
    graph.remove_with_shorter_scope_than_parent(&short);

    let b = graph.root_requirement("b").unwrap().candidates()[0];
    assert_eq!(graph.candidate(b).short_name(), "b");
    assert_eq!(graph.candidate(b).selected_scope(), Some("long"));
    let a = graph.requirement(graph.child_requirement(b, "a").unwrap());
    let kept: Vec<&str> = a.candidates().iter().map(|id| graph.candidate(*id).short_name()).collect();
    assert_eq!(kept, vec!["a1"]);
    assert!(matches!(
        graph.candidate(a.rejected()[0]).rejection(),
        Some(Rejection::InvalidScope { scope, .. }) if scope == "short"
    ));
}

#[test]
fn requirement_scope_overrides_component_default() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a").with_name("A").with_scope("test"));
    let test = Arc::new(
        ComponentDescriptor::new("test").requires(Requirement::named("a", "A").scope("session")),
    );
    let scope = Scope::chain(["session", "module", "test"]).unwrap();

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    let a = graph.root_requirement("a").unwrap().candidates()[0];
    assert_eq!(graph.candidate(a).selected_scope(), Some("session"));
    assert_eq!(graph.root_node().selected_scope(), Some("test"));
}

#[test]
fn filter_removes_component_not_matching_fixated_entity() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A").with_entity("entity1"));
    registry.register(ComponentDescriptor::new("a2").with_name("A").with_entity("entity2"));
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("a", "A")));
    let scope = Scope::root("scope");
    let fixated = HashMap::from([("A".to_string(), "entity1".to_string())]);

    let mut graph = build(&registry, &test, &scope);
    graph.remove_not_matching_fixated_entities(&fixated);

    assert_eq!(candidate_names(&graph, "a"), vec!["a1"]);
    let rejected = graph.root_requirement("a").unwrap().rejected()[0];
    assert_eq!(
        graph.candidate(rejected).rejection(),
        Some(&Rejection::FixatedOnOtherEntity("entity1".to_string()))
    );
}

#[test]
fn requirement_without_fixation_keeps_all_entities() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A").with_entity("a1"));
    registry.register(ComponentDescriptor::new("a2").with_name("A").with_entity("a2"));
    let test = Arc::new(
        ComponentDescriptor::new("test").requires(Requirement::named("a", "A").fixate_entities(false)),
    );
    let scope = Scope::root("scope");
    let fixated = HashMap::from([("A".to_string(), "a1".to_string())]);

    let mut graph = build(&registry, &test, &scope);
    graph.remove_not_matching_fixated_entities(&fixated);

    assert_eq!(candidate_names(&graph, "a"), vec!["a1", "a2"]);
}

#[test]
fn error_message_renders_whole_rejection_tree() {
    let mut registry = ComponentRegistry::new();
    registry.register(
        ComponentDescriptor::new("component_a_scope")
            .with_name("A")
            .with_cans(["stuff", "other_stuff"])
            .with_scope("short"),
    );
    registry.register(
        ComponentDescriptor::new("component_a_cans")
            .with_name("A")
            .with_cans(["no_stuff"]),
    );
    registry.register(
        ComponentDescriptor::new("component_a_depends")
            .with_name("A")
            .with_cans(["stuff", "other_stuff"])
            .requires(Requirement::named("require_not_exists", "NotExists")),
    );
    registry.register(
        ComponentDescriptor::new("component_b")
            .with_name("B")
            .with_scope("long")
            .requires(Requirement::named("require_a", "A").can(["stuff", "other_stuff"])),
    );
    registry.register(
        ComponentDescriptor::new("component_c")
            .with_name("C")
            .with_cans(["stuff2", "stuff3", "stuff4"]),
    );
    let component_d = registry.register(
        ComponentDescriptor::new("component_d")
            .with_name("D")
            .requires(Requirement::named("require_c", "C").can(["stuff2", "stuff3"])),
    );
    let test = Arc::new(
        ComponentDescriptor::new("test")
            .requires(Requirement::named("require_b", "B"))
            .requires(Requirement::direct("require_d", component_d)),
    );
    let short = Scope::chain(["long", "short"]).unwrap();

    let mut graph = build(&registry, &test, &short);
    let err = graph.resolve(&short, &no_fixation()).unwrap_err();

    let expected = "\
Error fulfilling requirements for test
U: Requirement 'require_b' with name 'B': Unfulfilled
  U: Component 'component_b' with name 'B': Unfulfilled requirements
    U: Requirement 'require_a' with name 'A' and cans 'other_stuff, stuff': Unfulfilled
      C: Component 'component_a_cans' with name 'A': Cans not fulfilled 'other_stuff, stuff'
      U: Component 'component_a_depends' with name 'A': Unfulfilled requirements
        M: Requirement 'require_not_exists' with name 'NotExists': Missing component 'NotExists'
      S: Component 'component_a_scope' with name 'A': Scope 'short' is not one of the valid scopes 'long'
F: Requirement 'require_d' with name 'component_d': Fulfilled
  E: Component 'component_d' with name 'component_d': Exists
    F: Requirement 'require_c' with name 'C' and cans 'stuff2, stuff3': Fulfilled
      E: Component 'component_c' with name 'C': Exists";
    assert_eq!(err.to_string(), expected);
}

#[test]
fn selection_picks_highest_priority() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A").with_priority(1));
    registry.register(ComponentDescriptor::new("a2").with_name("A").with_priority(2));
    registry.register(ComponentDescriptor::new("a3").with_name("A").with_priority(0));
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("a", "A")));
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.make_selections();

    let selected: Vec<(String, bool)> = graph
        .root_requirement("a")
        .unwrap()
        .candidates()
        .iter()
        .map(|id| {
            let candidate = graph.candidate(*id);
            (candidate.short_name().to_string(), candidate.is_selected())
        })
        .collect();
    assert_eq!(
        selected,
        vec![
            ("a1".to_string(), false),
            ("a2".to_string(), true),
            ("a3".to_string(), false)
        ]
    );
}

#[test]
fn equal_priorities_select_first_registered() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("first").with_name("A").with_priority(3));
    registry.register(ComponentDescriptor::new("second").with_name("A").with_priority(3));
    registry.register(ComponentDescriptor::new("low").with_name("A").with_priority(1));
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("a", "A")));
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    assert_eq!(selected_name(&graph, "a"), "first");
}

#[test]
fn extra_requirements_are_resolved_on_the_root() {
    let mut registry = ComponentRegistry::new();
    let comp = registry.register(ComponentDescriptor::new("comp").with_name("Comp"));
    let test = Arc::new(ComponentDescriptor::new("test").with_parameters(["c"]));
    let scope = Scope::root("scope");
    let extra = [Requirement::direct("c", Arc::clone(&comp))];

    let mut graph = DependencyGraphBuilder::new(&registry)
        .create_dependency_graph(&test, &scope, &extra, CallArguments::default())
        .unwrap();
    graph.resolve(&scope, &no_fixation()).unwrap();

    let requirement = graph.root_requirement("c").unwrap();
    assert!(matches!(
        requirement.requirement().target(),
        zaf_common::ComponentTarget::Direct(target) if Arc::ptr_eq(target, &comp)
    ));
    assert_eq!(selected_name(&graph, "c"), "comp");
}

#[test]
fn resolving_twice_is_refused() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a").with_name("A"));
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("a", "A")));
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();
    assert!(graph.is_resolved());
    assert!(matches!(
        graph.resolve(&scope, &no_fixation()),
        Err(ZafError::GraphAlreadyResolved)
    ));
}

#[test]
fn unreachable_empty_requirement_is_never_selected() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor::new("a1").with_name("A").with_priority(1));
    registry.register(
        ComponentDescriptor::new("a2")
            .with_name("A")
            .requires(Requirement::named("missing", "Missing")),
    );
    let test = Arc::new(ComponentDescriptor::new("test").requires(Requirement::named("a", "A")));
    let scope = Scope::root("scope");

    let mut graph = build(&registry, &test, &scope);
    graph.resolve(&scope, &no_fixation()).unwrap();

    assert_eq!(selected_name(&graph, "a"), "a1");
    let rejected = graph.root_requirement("a").unwrap().rejected()[0];
    let missing = graph.child_requirement(rejected, "missing").unwrap();
    assert!(graph.selected(missing).is_none());
    assert!(!graph.requirement(missing).selection_performed());
}
