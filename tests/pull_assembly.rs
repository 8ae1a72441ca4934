//! Integration tests for pull-direction attribute assembly.

use idm_mapper::engine::MappingEngine;
use idm_mapper::external::ExternalAttr;
use idm_mapper::graph::InMemoryGraph;
use idm_mapper::mapping::{
    ExternalResource, Mapping, MappingItem, OrgUnitItem, Provision,
};
use idm_mapper::model::{
    AnyDraft, AnyEntity, AnyTypeKind, AttrSchemaType, AttrValue, Group, OWNER_SENTINEL_SCHEMA,
    PlainAttr, Realm, RealmDraft, User,
};
use idm_mapper::schema::{PlainSchemaDef, SchemaRegistry, VirSchemaDef};

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.add_plain(PlainSchemaDef::new("email", AttrSchemaType::String));
    registry.add_plain(PlainSchemaDef::new("badge", AttrSchemaType::Binary));
    registry.add_virtual(VirSchemaDef::new("adGroups"));
    registry
}

fn engine() -> MappingEngine<InMemoryGraph> {
    MappingEngine::builder(InMemoryGraph::new(), registry()).build()
}

fn engine_with_group() -> MappingEngine<InMemoryGraph> {
    let mut graph = InMemoryGraph::new();
    graph.add_group(Group::new("g-staff", "staff"));
    MappingEngine::builder(graph, registry()).build()
}

#[test]
fn username_lands_on_user_draft() {
    let engine = engine();
    let item = MappingItem::new("username", "uid");
    let attr = ExternalAttr::single("uid", "jdoe".into());

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::User(user) = draft else {
        panic!("expected user draft")
    };
    assert_eq!(user.username.as_deref(), Some("jdoe"));
}

#[test]
fn group_name_lands_on_group_draft() {
    let engine = engine();
    let item = MappingItem::new("name", "cn");
    let attr = ExternalAttr::single("cn", "staff".into());

    let mut draft = AnyDraft::new(AnyTypeKind::Group);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::Group(group) = draft else {
        panic!("expected group draft")
    };
    assert_eq!(group.name.as_deref(), Some("staff"));
}

#[test]
fn pull_transformers_run_before_write() {
    let engine = engine();
    let mut item = MappingItem::new("email", "mail");
    item.transformers.push("lowercase".to_owned());
    let attr = ExternalAttr::single("mail", "A@X.COM".into());

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::User(user) = draft else {
        panic!("expected user draft")
    };
    assert_eq!(user.plain_attrs[0].schema, "email");
    assert_eq!(user.plain_attrs[0].values, vec!["a@x.com".to_owned()]);
}

#[test]
fn virtual_entries_keep_original_values() {
    let engine = engine();
    let mut item = MappingItem::new("adGroups", "memberOf");
    item.transformers.push("lowercase".to_owned());
    let attr = ExternalAttr::single("memberOf", "Mixed-Case".into());

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::User(user) = draft else {
        panic!("expected user draft")
    };
    assert_eq!(user.vir_attrs[0].values, vec!["Mixed-Case".to_owned()]);
}

#[test]
fn membership_scoped_entry_created_on_demand() {
    let engine = engine_with_group();
    let item = MappingItem::new("membership:staff.email", "staffMail");
    let attr = ExternalAttr::single("staffMail", "s@x.com".into());

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::User(user) = draft else {
        panic!("expected user draft")
    };
    assert!(user.plain_attrs.is_empty());
    assert_eq!(user.memberships.len(), 1);
    assert_eq!(user.memberships[0].group_key, "g-staff");
    assert_eq!(user.memberships[0].plain_attrs[0].values, vec!["s@x.com".to_owned()]);
}

#[test]
fn unknown_membership_group_falls_back_to_entity_level() {
    let engine = engine();
    let item = MappingItem::new("membership:staff.email", "staffMail");
    let attr = ExternalAttr::single("staffMail", "s@x.com".into());

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::User(user) = draft else {
        panic!("expected user draft")
    };
    assert!(user.memberships.is_empty());
    assert_eq!(user.plain_attrs[0].schema, "email");
}

#[test]
fn owner_stashed_under_sentinel_schema() {
    let engine = engine();
    let item = MappingItem::new("userOwner", "owner");
    let attr = ExternalAttr::single("owner", "uid=admin,ou=people".into());

    let mut draft = AnyDraft::new(AnyTypeKind::Group);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::Group(group) = draft else {
        panic!("expected group draft")
    };
    assert_eq!(group.plain_attrs[0].schema, OWNER_SENTINEL_SCHEMA);
    assert_eq!(
        group.plain_attrs[0].values,
        vec!["uid=admin,ou=people".to_owned()]
    );
}

#[test]
fn binary_values_become_base64_strings() {
    let engine = engine();
    let item = MappingItem::new("badge", "photo");
    let attr = ExternalAttr::single("photo", AttrValue::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]));

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, Some(&attr), &mut draft);

    let AnyDraft::User(user) = draft else {
        panic!("expected user draft")
    };
    assert_eq!(user.plain_attrs[0].values, vec!["3q2+7w==".to_owned()]);
}

#[test]
fn must_change_password_parses_leniently() {
    let engine = engine();
    let item = MappingItem::new("mustChangePassword", "pwdReset");

    for (raw, expected) in [("TRUE", true), ("yes", true), ("false", false)] {
        let attr = ExternalAttr::single("pwdReset", raw.into());
        let mut draft = AnyDraft::new(AnyTypeKind::User);
        engine.set_int_values(&item, Some(&attr), &mut draft);

        let AnyDraft::User(user) = draft else {
            panic!("expected user draft")
        };
        assert_eq!(user.must_change_password, Some(expected), "for '{}'", raw);
    }
}

#[test]
fn absent_attribute_writes_nothing() {
    let engine = engine();
    let item = MappingItem::new("email", "mail");

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, None, &mut draft);

    let AnyDraft::User(user) = draft else {
        panic!("expected user draft")
    };
    assert!(user.plain_attrs.is_empty());
}

#[test]
fn realm_fullpath_resolves_parent() {
    let mut graph = InMemoryGraph::new();
    graph.add_realm(Realm {
        key: "r-even".to_owned(),
        name: "even".to_owned(),
        full_path: "/even".to_owned(),
        parent: Some("/".to_owned()),
    });
    let engine = MappingEngine::builder(graph, registry()).build();

    let item = OrgUnitItem::new("fullpath", "entryDN");
    let attr = ExternalAttr::single("entryDN", "/even/two".into());

    let mut draft = RealmDraft::default();
    engine.set_realm_int_values(&item, Some(&attr), &mut draft);
    assert_eq!(draft.parent.as_deref(), Some("/even"));

    // unresolvable parent: logged and left unset
    let attr = ExternalAttr::single("entryDN", "/odd/three".into());
    let mut draft = RealmDraft::default();
    engine.set_realm_int_values(&item, Some(&attr), &mut draft);
    assert!(draft.parent.is_none());
}

#[test]
fn realm_name_pulled_directly() {
    let engine = engine();
    let item = OrgUnitItem::new("name", "ou");
    let attr = ExternalAttr::single("ou", "two".into());

    let mut draft = RealmDraft::default();
    engine.set_realm_int_values(&item, Some(&attr), &mut draft);
    assert_eq!(draft.name.as_deref(), Some("two"));
}

#[test]
fn pushed_attribute_round_trips_through_pull() {
    let mut graph = InMemoryGraph::new();
    let mut user = User::new("u1", "jdoe");
    user.plain_attrs
        .push(PlainAttr::new("email", vec!["a@x.com".into()]));
    graph.add_user(user.clone());
    let engine = MappingEngine::builder(graph, registry()).build();

    let item = MappingItem::new("email", "mail");
    let provision = Provision::new(
        AnyTypeKind::User,
        Mapping::new(vec![item.clone()]),
        ExternalResource::new("ldap"),
    );

    let root = AnyEntity::User(user);
    let (_, attrs) = engine.prepare_attrs(&root, None, false, None, &provision);
    let pushed = attrs.get("mail").unwrap();

    let mut draft = AnyDraft::new(AnyTypeKind::User);
    engine.set_int_values(&item, Some(pushed), &mut draft);

    let AnyDraft::User(pulled) = draft else {
        panic!("expected user draft")
    };
    assert_eq!(pulled.plain_attrs[0].schema, "email");
    assert_eq!(pulled.plain_attrs[0].values, vec!["a@x.com".to_owned()]);
}
