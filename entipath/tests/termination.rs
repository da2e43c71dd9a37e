mod support;

use entipath::prelude::*;
use support::{QCompany, QEmployee, QPerson, chain, chain_states};

fn unbounded() -> PathInits {
    PathInits::default().with_max_depth(None)
}

#[test]
fn self_reference_is_cut_at_the_root() {
    for inits in [PathInits::default(), unbounded(), PathInits::direct(10)] {
        let employee = QEmployee::with_inits(PathMetadata::root("e"), inits);
        assert_eq!(employee.manager.state(), AssociationState::Deferred);
        assert_eq!(employee.reports.element().state(), AssociationState::Deferred);
    }
}

#[test]
fn mutual_reference_is_cut_on_the_way_back() {
    let person = QPerson::with_inits(PathMetadata::root("p"), unbounded());
    assert_eq!(person.employer.state(), AssociationState::Eager);

    let company: &QCompany = person.employer.get();
    assert_eq!(company.employees.element().state(), AssociationState::Deferred);

    let company = QCompany::with_inits(PathMetadata::root("c"), unbounded());
    assert_eq!(company.employees.element().state(), AssociationState::Eager);
    assert_eq!(company.employees.any().employer.state(), AssociationState::Deferred);
}

#[test]
fn eager_overrides_on_every_cyclic_edge_still_terminate() {
    let inits = unbounded()
        .with_override("Employee.manager", Expansion::Eager)
        .with_override("Employee.reports", Expansion::Eager);
    let employee = QEmployee::with_inits(PathMetadata::root("e"), inits);

    assert_eq!(employee.manager.state(), AssociationState::Eager);
    assert_eq!(employee.reports.element().state(), AssociationState::Eager);

    let manager = employee.manager.get();
    assert_eq!(manager.manager.state(), AssociationState::Deferred);
    assert_eq!(manager.reports.element().state(), AssociationState::Eager);

    let peer = manager.reports.any();
    assert_eq!(peer.manager.state(), AssociationState::Deferred);
    assert_eq!(peer.reports.element().state(), AssociationState::Deferred);
}

#[test]
fn mutual_overrides_terminate() {
    let inits = unbounded()
        .with_override("Person.employer", Expansion::Eager)
        .with_override("Company.employees", Expansion::Eager);
    let person = QPerson::with_inits(PathMetadata::root("p"), inits);

    let company = person.employer.get();
    assert_eq!(company.employees.element().state(), AssociationState::Eager);
    let colleague = company.employees.any();
    assert_eq!(colleague.employer.state(), AssociationState::Deferred);
    assert_eq!(
        colleague.name.metadata().to_string(),
        "any(p.employer.employees).name"
    );
}

#[test]
fn forcing_deferred_edges_reaches_any_depth() {
    let employee = QEmployee::root("e");
    let mut current = employee.manager.get();
    for _ in 0..20 {
        current = current.manager.get();
    }
    assert_eq!(current.metadata().depth(), 21);
    assert_eq!(current.manager.state(), AssociationState::Deferred);
}

#[test]
fn unbounded_chain_of_distinct_entities_is_fully_eager() {
    let root = chain(0, 6).build(PathMetadata::root("l"), unbounded());
    assert_eq!(chain_states(&root), vec![AssociationState::Eager; 6]);
}
