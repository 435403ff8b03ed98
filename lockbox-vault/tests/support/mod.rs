//! Shared fixtures for vault protocol tests.
//!
//! RSA keypairs are expensive to generate, so the identities used across a
//! test binary are generated once.

#![allow(dead_code)]

use lockbox_crypto::IdentityKeyPair;
use lockbox_vault::{
    create_group, Group, MembershipRegistry, Owner, PrincipalId, Recipient, SecretData,
    UnlockedIdentity, VaultConfig,
};
use std::sync::LazyLock;

pub static ALICE: LazyLock<IdentityKeyPair> = LazyLock::new(keypair);
pub static BOB: LazyLock<IdentityKeyPair> = LazyLock::new(keypair);
pub static CAROL: LazyLock<IdentityKeyPair> = LazyLock::new(keypair);

fn keypair() -> IdentityKeyPair {
    IdentityKeyPair::generate().expect("keypair generation must succeed")
}

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config() -> VaultConfig {
    VaultConfig::default()
}

pub fn identity(user_id: &str, keypair: &IdentityKeyPair) -> UnlockedIdentity {
    UnlockedIdentity::new(user_id, keypair.clone())
}

pub fn gmail() -> SecretData {
    SecretData {
        name: "Gmail".into(),
        username: "a@b.com".into(),
        password: "p@ss".into(),
        url: Some("https://gmail.com".into()),
        notes: None,
    }
}

pub fn user_recipient(user_id: &str, keypair: &IdentityKeyPair) -> Recipient {
    Recipient::new(PrincipalId::user(user_id), keypair.public.clone())
}

/// A group `g1` owned by alice, with alice's membership registered.
pub struct GroupFixture {
    pub group: Group,
    pub registry: MembershipRegistry,
}

impl GroupFixture {
    pub fn recipient(&self) -> Recipient {
        Recipient::from_pem(
            PrincipalId::group(&self.group.id),
            self.group.group_public_key.as_deref().expect("group has a key"),
        )
        .expect("group key must import")
    }

    pub fn owner(&self) -> Owner {
        Owner::Group(self.group.id.clone())
    }
}

pub fn alice_group() -> GroupFixture {
    let created =
        create_group("g1", "alice", &ALICE.public, &config()).expect("group creation must succeed");
    let registry = MembershipRegistry::new();
    registry.insert(created.owner_membership);
    GroupFixture {
        group: Group {
            id: "g1".into(),
            name: "Family".into(),
            owner_id: "alice".into(),
            member_ids: vec!["alice".into()],
            group_public_key: Some(created.group_public_key),
        },
        registry,
    }
}

/// A lookup for callers that belong to no group.
pub fn no_groups() -> MembershipRegistry {
    MembershipRegistry::new()
}
