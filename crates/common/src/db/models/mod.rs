//! SeaORM entity models
//!
//! Database entities backing the graph repository

mod platform;
mod article;
mod internal_link;
mod external_link;
mod authority_domain;

pub use platform::{
    Entity as PlatformEntity,
    Model as PlatformRow,
    Column as PlatformColumn,
};

pub use article::{
    Entity as ArticleEntity,
    Model as ArticleRow,
    Column as ArticleColumn,
};

pub use internal_link::{
    Entity as InternalLinkEntity,
    Model as InternalLinkRow,
    ActiveModel as InternalLinkActiveModel,
    Column as InternalLinkColumn,
};

pub use external_link::{
    Entity as ExternalLinkEntity,
    Model as ExternalLinkRow,
    ActiveModel as ExternalLinkActiveModel,
    Column as ExternalLinkColumn,
};

pub use authority_domain::{
    Entity as AuthorityDomainEntity,
    Model as AuthorityDomainRow,
    Column as AuthorityDomainColumn,
};
