//! Contract resolution.
//!
//! Turns the declaration collected from [`Entity::describe`] into a
//! [`TypeDescriptor`]. Resolution is a pure function of the type and the
//! naming policy, so its outcome (success or failure) can be cached for the
//! life of the process.

use crate::contract::{ContractBuilder, MemberDecl};
use crate::descriptor::{MemberDescriptor, SystemProperties, SystemProperty, TypeDescriptor, ID_WIRE_NAME};
use crate::error::ContractError;
use crate::settings::NamingPolicy;
use crate::Entity;

/// A member that survived filtering, with its wire name chosen.
struct Candidate<T> {
    decl: MemberDecl<T>,
    wire_name: String,
    system: Option<SystemProperty>,
}

/// Resolve the contract of `T`.
pub(crate) fn resolve<T: Entity>(naming: NamingPolicy) -> Result<TypeDescriptor<T>, ContractError> {
    let builder = ContractBuilder::<T>::collect();
    let type_name = builder.type_name();
    let data_contract = builder.is_data_contract();

    for link in builder.hierarchy_links() {
        if link.derived_data_contract != link.base_data_contract {
            return Err(ContractError::InconsistentHierarchy {
                derived: link.derived.to_string(),
                base: link.base.to_string(),
            });
        }
    }

    let table_name = builder
        .declared_table_name()
        .unwrap_or(type_name)
        .to_string();

    let mut candidates: Vec<Candidate<T>> = builder
        .into_members()
        .into_iter()
        .filter(|decl| is_serialized(decl, data_contract))
        .map(|decl| Candidate {
            wire_name: wire_name(&decl, naming),
            system: decl.attributes.system,
            decl,
        })
        .collect();

    bind_system_members(type_name, &mut candidates)?;
    let id = find_id(type_name, &candidates)?;
    check_unique_names(type_name, &candidates)?;

    let system: SystemProperties = candidates.iter().filter_map(|c| c.system).collect();
    let members = candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| MemberDescriptor {
            wire_name: candidate.wire_name,
            declared_name: candidate.decl.name,
            kind: candidate.decl.kind,
            nullable: candidate.decl.nullable,
            has_converter: candidate.decl.has_converter,
            system: candidate.system,
            is_id: id == Some(index),
            source_depth: candidate.decl.depth,
            declaring_type: candidate.decl.declaring_type,
            access: candidate.decl.access,
        })
        .collect();

    Ok(TypeDescriptor {
        type_name,
        table_name,
        members,
        id,
        system,
    })
}

fn is_serialized<T>(decl: &MemberDecl<T>, data_contract: bool) -> bool {
    if decl.attributes.ignore {
        return false;
    }
    // Data-contract types serialize opted-in members only; a direct rename
    // counts as opting in. System bindings always serialize.
    !data_contract
        || decl.attributes.data_member.is_some()
        || decl.attributes.json_name.is_some()
        || decl.attributes.system.is_some()
}

fn wire_name<T>(decl: &MemberDecl<T>, naming: NamingPolicy) -> String {
    if let Some(name) = &decl.attributes.json_name {
        return name.clone();
    }
    if decl.declaring_data_contract {
        if let Some(Some(name)) = &decl.attributes.data_member {
            return name.clone();
        }
    }
    naming.apply(&decl.name)
}

/// Bind explicit system annotations first, then members whose wire name
/// matches a free role. Bound members take the role's fixed wire name.
fn bind_system_members<T>(type_name: &str, candidates: &mut [Candidate<T>]) -> Result<(), ContractError> {
    for property in SystemProperty::ALL {
        let mut explicit = candidates.iter().filter(|c| c.system == Some(property));
        let first = explicit.next();
        if let (Some(first), Some(second)) = (first, explicit.next()) {
            return Err(ContractError::DuplicateSystemMember {
                type_name: type_name.to_string(),
                role: property.role(),
                first: first.decl.name.clone(),
                second: second.decl.name.clone(),
            });
        }
        if first.is_none() {
            if let Some(implicit) = candidates
                .iter_mut()
                .find(|c| c.system.is_none() && SystemProperty::from_wire_name(&c.wire_name) == Some(property))
            {
                implicit.system = Some(property);
            }
        }
    }

    for candidate in candidates.iter_mut() {
        if let Some(property) = candidate.system {
            candidate.wire_name = property.wire_name().to_string();
        }
    }
    Ok(())
}

fn find_id<T>(type_name: &str, candidates: &[Candidate<T>]) -> Result<Option<usize>, ContractError> {
    let mut ids = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.wire_name.eq_ignore_ascii_case(ID_WIRE_NAME));
    let first = ids.next().map(|(index, _)| index);
    if ids.next().is_some() {
        return Err(ContractError::DuplicateId {
            type_name: type_name.to_string(),
            id_name: ID_WIRE_NAME.to_string(),
        });
    }
    Ok(first)
}

fn check_unique_names<T>(type_name: &str, candidates: &[Candidate<T>]) -> Result<(), ContractError> {
    for (index, candidate) in candidates.iter().enumerate() {
        if let Some(earlier) = candidates[..index]
            .iter()
            .find(|c| c.wire_name.eq_ignore_ascii_case(&candidate.wire_name))
        {
            return Err(ContractError::DuplicateWireName {
                type_name: type_name.to_string(),
                wire_name: candidate.wire_name.clone(),
                first: earlier.decl.name.clone(),
                second: candidate.decl.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ValueKind;
    use chrono::{DateTime, Utc};

    fn wire_names<T>(descriptor: &TypeDescriptor<T>) -> Vec<&str> {
        descriptor.members().iter().map(|m| m.wire_name()).collect()
    }

    #[derive(Default)]
    struct Plain {
        id: i64,
        first_name: String,
        hidden: bool,
    }

    impl Entity for Plain {
        const TYPE_NAME: &'static str = "Plain";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("Id", |p| &p.id, |p| &mut p.id);
            contract.member("FirstName", |p| &p.first_name, |p| &mut p.first_name);
            contract.member("Hidden", |p| &p.hidden, |p| &mut p.hidden).ignore();
        }
    }

    #[test]
    fn declared_names_are_verbatim() {
        let descriptor = resolve::<Plain>(NamingPolicy::Verbatim).unwrap();
        assert_eq!(wire_names(&descriptor), vec!["Id", "FirstName"]);
        assert_eq!(descriptor.id_member().unwrap().declared_name(), "Id");
        assert_eq!(descriptor.table_name(), "Plain");
        assert!(descriptor.system_properties().is_empty());
    }

    #[test]
    fn camel_casing_applies_to_declared_names() {
        let descriptor = resolve::<Plain>(NamingPolicy::CamelCase).unwrap();
        assert_eq!(wire_names(&descriptor), vec!["id", "firstName"]);
    }

    #[derive(Default)]
    struct NoId {
        name: String,
    }

    impl Entity for NoId {
        const TYPE_NAME: &'static str = "NoId";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("Name", |n| &n.name, |n| &mut n.name);
        }
    }

    #[test]
    fn missing_id_is_reported_on_use() {
        let descriptor = resolve::<NoId>(NamingPolicy::Verbatim).unwrap();
        let err = descriptor.require_id().unwrap_err();
        assert_eq!(err.to_string(), "no id member found on type `NoId`");
        // Deterministic on every use.
        assert_eq!(descriptor.require_id().unwrap_err(), err);
    }

    #[derive(Default)]
    struct TwoIds {
        lower: i64,
        upper: i64,
    }

    impl Entity for TwoIds {
        const TYPE_NAME: &'static str = "TwoIds";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("id", |t| &t.lower, |t| &mut t.lower);
            contract.member("ID", |t| &t.upper, |t| &mut t.upper);
        }
    }

    #[test]
    fn duplicate_id_differing_by_case() {
        let err = resolve::<TwoIds>(NamingPolicy::Verbatim).unwrap_err();
        assert_eq!(
            err.to_string(),
            "only one member may have the property name `id` (regardless of casing) on type `TwoIds`"
        );
    }

    #[derive(Default)]
    struct Renamed {
        id: i64,
        a: String,
        b: String,
    }

    impl Entity for Renamed {
        const TYPE_NAME: &'static str = "Renamed";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("Id", |r| &r.id, |r| &mut r.id);
            contract.member("A", |r| &r.a, |r| &mut r.a).json_name("Title");
            contract.member("B", |r| &r.b, |r| &mut r.b).json_name("title");
        }
    }

    #[test]
    fn duplicate_wire_names_ignore_case() {
        let err = resolve::<Renamed>(NamingPolicy::Verbatim).unwrap_err();
        assert_eq!(
            err,
            ContractError::DuplicateWireName {
                type_name: "Renamed".into(),
                wire_name: "title".into(),
                first: "A".into(),
                second: "B".into(),
            }
        );
    }

    #[derive(Default)]
    struct Contracted {
        id: String,
        both: String,
        data_only: String,
        plain: String,
        renamed_only: String,
    }

    impl Entity for Contracted {
        const TYPE_NAME: &'static str = "Contracted";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.data_contract();
            contract.member("Id", |c| &c.id, |c| &mut c.id).data_member_named("id");
            contract
                .member("Both", |c| &c.both, |c| &mut c.both)
                .data_member_named("fromDataMember")
                .json_name("fromJsonName");
            contract
                .member("DataOnly", |c| &c.data_only, |c| &mut c.data_only)
                .data_member_named("fromDataMemberOnly");
            contract.member("Plain", |c| &c.plain, |c| &mut c.plain);
            contract
                .member("RenamedOnly", |c| &c.renamed_only, |c| &mut c.renamed_only)
                .json_name("renamed");
        }
    }

    #[test]
    fn attribute_precedence() {
        let descriptor = resolve::<Contracted>(NamingPolicy::CamelCase).unwrap();
        // The direct rename wins, then the data-member name; unannotated
        // members are not part of a data contract.
        assert_eq!(
            wire_names(&descriptor),
            vec!["id", "fromJsonName", "fromDataMemberOnly", "renamed"]
        );
    }

    #[derive(Default)]
    struct LooseDataMember {
        id: i64,
        note: String,
    }

    impl Entity for LooseDataMember {
        const TYPE_NAME: &'static str = "LooseDataMember";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("Id", |l| &l.id, |l| &mut l.id);
            contract
                .member("Note", |l| &l.note, |l| &mut l.note)
                .data_member_named("annotated");
        }
    }

    #[test]
    fn data_member_name_needs_data_contract_type() {
        let descriptor = resolve::<LooseDataMember>(NamingPolicy::Verbatim).unwrap();
        assert_eq!(wire_names(&descriptor), vec!["Id", "Note"]);
    }

    #[derive(Default)]
    struct Versioned {
        id: String,
        created: Option<DateTime<Utc>>,
        stamp: Option<String>,
        updated: Option<DateTime<Utc>>,
    }

    impl Entity for Versioned {
        const TYPE_NAME: &'static str = "Versioned";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("id", |v| &v.id, |v| &mut v.id);
            contract
                .member("Created", |v| &v.created, |v| &mut v.created)
                .system(SystemProperty::CreatedAt)
                .json_name("created");
            contract
                .member("Stamp", |v| &v.stamp, |v| &mut v.stamp)
                .system(SystemProperty::Version);
            contract.member("__UpdatedAt", |v| &v.updated, |v| &mut v.updated);
        }
    }

    #[test]
    fn system_members_use_fixed_names() {
        let descriptor = resolve::<Versioned>(NamingPolicy::CamelCase).unwrap();
        assert_eq!(
            wire_names(&descriptor),
            vec!["id", "__createdAt", "__version", "__updatedAt"]
        );
        let system: Vec<_> = descriptor.system_properties().iter().collect();
        assert_eq!(system, SystemProperty::ALL.to_vec());
        assert_eq!(
            descriptor
                .system_member(SystemProperty::Version)
                .unwrap()
                .declared_name(),
            "Stamp"
        );
        assert_eq!(
            descriptor
                .system_member(SystemProperty::CreatedAt)
                .unwrap()
                .kind(),
            ValueKind::DateTime
        );
    }

    #[derive(Default)]
    struct Clash {
        id: i64,
        version: String,
        other: String,
    }

    impl Entity for Clash {
        const TYPE_NAME: &'static str = "Clash";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("Id", |c| &c.id, |c| &mut c.id);
            contract
                .member("Version", |c| &c.version, |c| &mut c.version)
                .system(SystemProperty::Version);
            contract.member("__version", |c| &c.other, |c| &mut c.other);
        }
    }

    #[test]
    fn incidental_system_name_conflicts() {
        let err = resolve::<Clash>(NamingPolicy::Verbatim).unwrap_err();
        assert!(
            matches!(&err, ContractError::DuplicateWireName { wire_name, .. } if wire_name == "__version"),
            "{err}"
        );
    }

    #[derive(Default)]
    struct DoubleVersion {
        id: i64,
        a: String,
        b: String,
    }

    impl Entity for DoubleVersion {
        const TYPE_NAME: &'static str = "DoubleVersion";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("Id", |d| &d.id, |d| &mut d.id);
            contract
                .member("A", |d| &d.a, |d| &mut d.a)
                .system(SystemProperty::Version);
            contract
                .member("B", |d| &d.b, |d| &mut d.b)
                .system(SystemProperty::Version);
        }
    }

    #[test]
    fn one_member_per_system_role() {
        let err = resolve::<DoubleVersion>(NamingPolicy::Verbatim).unwrap_err();
        assert_eq!(
            err,
            ContractError::DuplicateSystemMember {
                type_name: "DoubleVersion".into(),
                role: "version",
                first: "A".into(),
                second: "B".into(),
            }
        );
    }

    #[derive(Default)]
    struct PlainBase {
        id: i64,
        owner: String,
    }

    impl Entity for PlainBase {
        const TYPE_NAME: &'static str = "PlainBase";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.member("Id", |b| &b.id, |b| &mut b.id);
            contract.member("Owner", |b| &b.owner, |b| &mut b.owner);
        }
    }

    #[derive(Default)]
    struct PlainDerived {
        base: PlainBase,
        title: String,
    }

    impl Entity for PlainDerived {
        const TYPE_NAME: &'static str = "PlainDerived";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.inherit(|d| &d.base, |d| &mut d.base);
            contract.member("Title", |d| &d.title, |d| &mut d.title);
        }
    }

    #[test]
    fn inherited_members_are_flattened() {
        let descriptor = resolve::<PlainDerived>(NamingPolicy::Verbatim).unwrap();
        assert_eq!(wire_names(&descriptor), vec!["Id", "Owner", "Title"]);
        let depths: Vec<_> = descriptor.members().iter().map(|m| m.source_depth()).collect();
        assert_eq!(depths, vec![1, 1, 0]);
        assert_eq!(descriptor.members()[1].declaring_type(), "PlainBase");
    }

    #[derive(Default)]
    struct ShadowingDerived {
        base: PlainBase,
        owner: String,
    }

    impl Entity for ShadowingDerived {
        const TYPE_NAME: &'static str = "ShadowingDerived";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.inherit(|d| &d.base, |d| &mut d.base);
            contract.member("owner", |d| &d.owner, |d| &mut d.owner);
        }
    }

    #[test]
    fn names_are_unique_across_the_hierarchy() {
        let err = resolve::<ShadowingDerived>(NamingPolicy::Verbatim).unwrap_err();
        assert!(matches!(err, ContractError::DuplicateWireName { .. }));
    }

    #[derive(Default)]
    struct ContractDerived {
        base: PlainBase,
        title: String,
    }

    impl Entity for ContractDerived {
        const TYPE_NAME: &'static str = "ContractDerived";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.data_contract();
            contract.inherit(|d| &d.base, |d| &mut d.base);
            contract
                .member("Title", |d| &d.title, |d| &mut d.title)
                .data_member();
        }
    }

    #[derive(Default)]
    struct ContractBase {
        id: i64,
    }

    impl Entity for ContractBase {
        const TYPE_NAME: &'static str = "ContractBase";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.data_contract();
            contract.member("Id", |b| &b.id, |b| &mut b.id).data_member_named("id");
        }
    }

    #[derive(Default)]
    struct LooseDerived {
        base: ContractBase,
        title: String,
    }

    impl Entity for LooseDerived {
        const TYPE_NAME: &'static str = "LooseDerived";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.inherit(|d| &d.base, |d| &mut d.base);
            contract.member("Title", |d| &d.title, |d| &mut d.title);
        }
    }

    #[derive(Default)]
    struct LooseGrandchild {
        parent: LooseDerived,
    }

    impl Entity for LooseGrandchild {
        const TYPE_NAME: &'static str = "LooseGrandchild";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.inherit(|g| &g.parent, |g| &mut g.parent);
        }
    }

    #[test]
    fn hierarchy_must_agree_on_data_contract() {
        let err = resolve::<ContractDerived>(NamingPolicy::Verbatim).unwrap_err();
        assert_eq!(
            err,
            ContractError::InconsistentHierarchy {
                derived: "ContractDerived".into(),
                base: "PlainBase".into(),
            }
        );

        let err = resolve::<LooseDerived>(NamingPolicy::Verbatim).unwrap_err();
        assert_eq!(
            err,
            ContractError::InconsistentHierarchy {
                derived: "LooseDerived".into(),
                base: "ContractBase".into(),
            }
        );

        // Ancestors further up are checked too.
        let err = resolve::<LooseGrandchild>(NamingPolicy::Verbatim).unwrap_err();
        assert!(matches!(err, ContractError::InconsistentHierarchy { base, .. } if base == "ContractBase"));
    }

    #[derive(Default)]
    struct CustomTable {
        id: i64,
    }

    impl Entity for CustomTable {
        const TYPE_NAME: &'static str = "CustomTable";

        fn describe(contract: &mut ContractBuilder<Self>) {
            contract.table_name("todo_items");
            contract.member("Id", |c| &c.id, |c| &mut c.id);
        }
    }

    #[test]
    fn table_name_override() {
        let descriptor = resolve::<CustomTable>(NamingPolicy::Verbatim).unwrap();
        assert_eq!(descriptor.table_name(), "todo_items");
        assert_eq!(descriptor.type_name(), "CustomTable");
    }
}
