//! Users borrow books; every loan is recorded as a `UserLoanHistory`.
//!
//! `User.user_loan_histories` and `UserLoanHistory.user` form a cycle. With the default policy
//! the list element is built eagerly and the back reference is deferred:
//!
//! ```
//! use entipath::prelude::*;
//! use entipath::examples::library::{QUser, UserLoanStatus};
//!
//! let user = QUser::canonical();
//! let loan = user.user_loan_histories.any();
//! assert_eq!(loan.user.state(), AssociationState::Deferred);
//!
//! let returned = user.name.eq("Kim").and(loan.status.eq(UserLoanStatus::Returned));
//! assert_eq!(
//!     returned.to_string(),
//!     "user.name = Kim && any(user.user_loan_histories).status = RETURNED"
//! );
//! ```

use crate::entity::{EntityPathBase, EntityPathType};
use crate::inits::PathInits;
use crate::metadata::PathMetadata;
use crate::path::{EntityRef, EnumPath, ListPath, NumberPath, StringPath};
use crate::registry::{describe_entity, PathTypeRegistration};
use crate::types::PathEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserLoanStatus {
    Loaned,
    Returned,
}

impl PathEnum for UserLoanStatus {
    const NAME: &'static str = "UserLoanStatus";

    fn variant_name(&self) -> &'static str {
        match self {
            UserLoanStatus::Loaned => "LOANED",
            UserLoanStatus::Returned => "RETURNED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookType {
    Computer,
    Economy,
    Society,
    Language,
    Science,
}

impl PathEnum for BookType {
    const NAME: &'static str = "BookType";

    fn variant_name(&self) -> &'static str {
        match self {
            BookType::Computer => "COMPUTER",
            BookType::Economy => "ECONOMY",
            BookType::Society => "SOCIETY",
            BookType::Language => "LANGUAGE",
            BookType::Science => "SCIENCE",
        }
    }
}

/// Query path for `User`.
#[derive(Clone)]
pub struct QUser {
    base: EntityPathBase,
    pub age: NumberPath<i32>,
    pub id: NumberPath<i64>,
    pub name: StringPath,
    pub user_loan_histories: ListPath<QUserLoanHistory>,
}

impl EntityPathType for QUser {
    const ENTITY: &'static str = "User";
    const VARIABLE: &'static str = "user";

    fn with_inits(metadata: PathMetadata, inits: PathInits) -> Self {
        let mut base = EntityPathBase::new(Self::ENTITY, metadata, inits);
        Self {
            age: base.create_number("age"),
            id: base.create_number("id"),
            name: base.create_string("name"),
            user_loan_histories: base.create_list("user_loan_histories"),
            base,
        }
    }
}

crate::impl_entity_path!(QUser);

inventory::submit! {
    PathTypeRegistration {
        entity: QUser::ENTITY,
        variable: QUser::VARIABLE,
        describe: describe_entity::<QUser>,
    }
}

/// Query path for `UserLoanHistory`.
#[derive(Clone)]
pub struct QUserLoanHistory {
    base: EntityPathBase,
    pub book_name: StringPath,
    pub id: NumberPath<i64>,
    pub status: EnumPath<UserLoanStatus>,
    pub user: EntityRef<QUser>,
}

impl EntityPathType for QUserLoanHistory {
    const ENTITY: &'static str = "UserLoanHistory";
    const VARIABLE: &'static str = "userLoanHistory";

    fn with_inits(metadata: PathMetadata, inits: PathInits) -> Self {
        let mut base = EntityPathBase::new(Self::ENTITY, metadata, inits);
        Self {
            book_name: base.create_string("book_name"),
            id: base.create_number("id"),
            status: base.create_enum("status"),
            user: base.create_entity("user"),
            base,
        }
    }
}

crate::impl_entity_path!(QUserLoanHistory);

inventory::submit! {
    PathTypeRegistration {
        entity: QUserLoanHistory::ENTITY,
        variable: QUserLoanHistory::VARIABLE,
        describe: describe_entity::<QUserLoanHistory>,
    }
}

/// Query path for `Book`.
#[derive(Clone)]
pub struct QBook {
    base: EntityPathBase,
    pub book_type: EnumPath<BookType>,
    pub id: NumberPath<i64>,
    pub name: StringPath,
}

impl EntityPathType for QBook {
    const ENTITY: &'static str = "Book";
    const VARIABLE: &'static str = "book";

    fn with_inits(metadata: PathMetadata, inits: PathInits) -> Self {
        let mut base = EntityPathBase::new(Self::ENTITY, metadata, inits);
        Self {
            book_type: base.create_enum("book_type"),
            id: base.create_number("id"),
            name: base.create_string("name"),
            base,
        }
    }
}

crate::impl_entity_path!(QBook);

inventory::submit! {
    PathTypeRegistration {
        entity: QBook::ENTITY,
        variable: QBook::VARIABLE,
        describe: describe_entity::<QBook>,
    }
}
