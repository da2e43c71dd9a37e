use std::sync::Arc;

use entipath::examples::library::{BookType, QBook, QUser, QUserLoanHistory, UserLoanStatus};
use entipath::prelude::*;
use entipath::tree;

#[test]
fn loan_histories_are_eager_and_back_reference_is_deferred() {
    let user = QUser::canonical();
    let loans = &user.user_loan_histories;
    assert_eq!(loans.element().state(), AssociationState::Eager);

    let loan = loans.any();
    assert_eq!(loan.entity_type(), "UserLoanHistory");
    assert_eq!(loan.user.state(), AssociationState::Deferred);
}

#[test]
fn forcing_back_reference_matches_a_freshly_built_user() {
    let user = QUser::canonical();
    let back = &user.user_loan_histories.any().user;
    let forced = back.get();

    let fresh = QUser::from_metadata(back.metadata().clone());
    assert_eq!(forced, &fresh);
    assert_eq!(forced.metadata().key(), fresh.metadata().key());
    assert_eq!(forced.age.metadata(), fresh.age.metadata());
    assert_ne!(forced.metadata(), user.metadata());

    // the forced user expands its own loans again under a fresh budget
    assert_eq!(forced.user_loan_histories.element().state(), AssociationState::Eager);
    assert_eq!(
        forced.user_loan_histories.any().book_name.metadata().to_string(),
        "any(any(user.user_loan_histories).user.user_loan_histories).book_name"
    );
}

#[test]
fn self_join_aliases_stay_distinct() {
    let borrower = QUser::root("borrower");
    let lender = QUser::root("lender");
    assert_ne!(borrower, lender);
    assert_ne!(borrower.name.identity_key(), lender.name.identity_key());

    let same_name = borrower.name.eq_path(&lender.name).and(borrower.id.ne_path(&lender.id));
    assert_eq!(same_name.to_string(), "borrower.name = lender.name && borrower.id != lender.id");
    let referenced: Vec<String> = same_name.paths().iter().map(ToString::to_string).collect();
    assert_eq!(referenced, ["borrower.name", "lender.name", "borrower.id", "lender.id"]);
}

#[test]
fn conditional_filters_and_ordering() {
    let user = QUser::canonical();
    let loan = user.user_loan_histories.any();
    let min_age: Option<i32> = Some(20);
    let status: Option<UserLoanStatus> = None;

    let filter = Predicate::all([
        min_age.map(|age| user.age.goe(age)),
        status.map(|status| loan.status.eq(status)),
        Some(user.user_loan_histories.is_not_empty()),
    ])
    .unwrap();
    assert_eq!(filter.paths().len(), 2);
    assert!(filter.to_string().starts_with("user.age >= 20 && "));

    let order = user.name.asc().nulls_last();
    assert_eq!(order.to_string(), "user.name ASC NULLS LAST");
    assert_eq!(user.age.desc().to_string(), "user.age DESC");
}

#[test]
fn predicates_serialize_for_the_evaluation_engine() {
    let book = QBook::canonical();
    let predicate = book.book_type.is_in([BookType::Computer, BookType::Science]);
    let json = serde_json::to_value(&predicate).unwrap();
    assert!(json.to_string().contains("COMPUTER"));
    assert!(json.to_string().contains("book_type"));
}

#[test]
fn registry_caches_library_roots() {
    let registry = PathRegistry::new();
    let a = registry.canonical::<QUser>();
    let b = registry.root::<QUser>("user");
    let loan = registry.canonical::<QUserLoanHistory>();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 2);
    assert_eq!(loan.metadata().to_string(), "userLoanHistory");
    assert_eq!(*a, QUser::canonical());
}

#[test]
fn tree_shows_policy_outcome() {
    let user = QUser::canonical();
    let entries = tree::walk(&user, 0);
    let rendered = tree::render(&entries);
    assert!(rendered.contains("user_loan_histories : List<UserLoanHistory> [eager]"));
    assert!(rendered.contains("\n  user : User [deferred]\n"));
    assert!(entries.iter().any(|entry| entry.path == "any(user.user_loan_histories).status"));
}

#[test]
fn from_path_views_a_position_as_an_entity() {
    let loan = QUserLoanHistory::canonical();
    let user = QUser::from_path(&loan.user);
    assert_eq!(user.metadata(), loan.user.metadata());

    // `User` is not on the chain from a loan root, so the edge is built eagerly;
    // the loans of that user lead back into the chain and stay deferred
    assert_eq!(loan.user.state(), AssociationState::Eager);
    assert_eq!(loan.user.get().user_loan_histories.element().state(), AssociationState::Deferred);
}
