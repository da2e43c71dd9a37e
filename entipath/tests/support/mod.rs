//! Typed entity paths over small cyclic schemas shared by the integration suites.
#![allow(dead_code)]

use entipath::prelude::*;

/// `Employee.manager` and `Employee.reports` both point back at `Employee`.
#[derive(Clone)]
pub struct QEmployee {
    base: EntityPathBase,
    pub name: StringPath,
    pub salary: NumberPath<i64>,
    pub manager: EntityRef<QEmployee>,
    pub reports: ListPath<QEmployee>,
}

impl EntityPathType for QEmployee {
    const ENTITY: &'static str = "Employee";
    const VARIABLE: &'static str = "employee";

    fn with_inits(metadata: PathMetadata, inits: PathInits) -> Self {
        let mut base = EntityPathBase::new(Self::ENTITY, metadata, inits);
        Self {
            name: base.create_string("name"),
            salary: base.create_number("salary"),
            manager: base.create_entity("manager"),
            reports: base.create_list("reports"),
            base,
        }
    }
}

entipath::impl_entity_path!(QEmployee);

/// `Person.employer -> Company` and `Company.employees -> Person`.
#[derive(Clone)]
pub struct QPerson {
    base: EntityPathBase,
    pub name: StringPath,
    pub employer: EntityRef<QCompany>,
}

impl EntityPathType for QPerson {
    const ENTITY: &'static str = "Person";
    const VARIABLE: &'static str = "person";

    fn with_inits(metadata: PathMetadata, inits: PathInits) -> Self {
        let mut base = EntityPathBase::new(Self::ENTITY, metadata, inits);
        Self {
            name: base.create_string("name"),
            employer: base.create_entity("employer"),
            base,
        }
    }
}

entipath::impl_entity_path!(QPerson);

#[derive(Clone)]
pub struct QCompany {
    base: EntityPathBase,
    pub title: StringPath,
    pub employees: SetPath<QPerson>,
}

impl EntityPathType for QCompany {
    const ENTITY: &'static str = "Company";
    const VARIABLE: &'static str = "company";

    fn with_inits(metadata: PathMetadata, inits: PathInits) -> Self {
        let mut base = EntityPathBase::new(Self::ENTITY, metadata, inits);
        Self {
            title: base.create_string("title"),
            employees: base.create_set("employees"),
            base,
        }
    }
}

entipath::impl_entity_path!(QCompany);

/// Untyped linear chain `L0.next -> L1.next -> ... -> L{last}` of distinct entity types.
pub fn chain(level: usize, last: usize) -> EntityTarget<EntityPathBase> {
    EntityTarget::new(format!("L{level}"), move |metadata, inits| {
        let mut base = EntityPathBase::new(format!("L{level}"), metadata, inits);
        base.create_number::<i32>("value");
        if level < last {
            base.create_entity_with("next", &chain(level + 1, last));
        }
        base
    })
}

/// States of `next` along the chain, following built children only.
pub fn chain_states(root: &EntityPathBase) -> Vec<AssociationState> {
    let mut states = Vec::new();
    let mut current = root;
    while let Some(next) = current.attribute("next").and_then(|attribute| attribute.association()) {
        states.push(next.state());
        match next.peek_base() {
            Some(child) => current = child,
            None => break,
        }
    }
    states
}
