//! Small demo graph: a client project, an R&D sub-project and a document.
//!
//! Both directions of every link are populated, so the graph is consistent.

use std::collections::BTreeMap;

use serde_json::json;

use crate::activity::{ActivityVersion, AttributeSet, AttributeSetManifest, Blob, Period};
use crate::lang::LANG_ANY;
use crate::participation::{Participation, Participator, Person};

pub const PROJECT_X: &str = "aldb.clientcorp.eu/activities/project-x";
pub const RND: &str = "aldb.clientcorp.eu/activities/rnd";
pub const DOC_3: &str = "aldb.clientcorp.eu/activities/doc-3";

pub const ROLE_LEAD: &str = "aldb.org/roles/lead";
pub const ROLE_AUTHOR: &str = "aldb.org/roles/author";

const PROJECT_MANIFEST: &str = "http://projo.com/schemas/project";
const TEXT_MANIFEST: &str = "aldb.org/attribute-manifests/text";

/// Root id of [`project_x`].
pub fn root_id() -> &'static str {
    PROJECT_X
}

/// The three sample activities, root first.
pub fn project_x() -> Vec<ActivityVersion> {
    let project = ActivityVersion {
        period: Some(Period::starting("2019-07-25")),
        participations: vec![lead()],
        subs: vec![ActivityVersion::stub(RND, "1")],
        attribute_sets: project_attrs(456_000.0),
        ..ActivityVersion::stub(PROJECT_X, "1").with_label(LANG_ANY, "Project X")
    };

    let rnd = ActivityVersion {
        period: Some(Period::starting("2020-07-25")),
        participations: vec![lead()],
        subs: vec![ActivityVersion::stub(DOC_3, "1")],
        supers: vec![ActivityVersion::stub(PROJECT_X, "1")],
        attribute_sets: project_attrs(123_000.0),
        ..ActivityVersion::stub(RND, "1").with_label(LANG_ANY, "R&D")
    };

    let mut text_attrs = AttributeSet {
        manifest: Some(AttributeSetManifest {
            id: Some(TEXT_MANIFEST.to_string()),
        }),
        ..Default::default()
    };
    text_attrs
        .attributes
        .insert("language".to_string(), json!("en-gb"));

    let doc = ActivityVersion {
        participations: vec![Participation::new(member(), [ROLE_AUTHOR])],
        supers: vec![ActivityVersion::stub(RND, "1")],
        attribute_sets: BTreeMap::from([("text-attrs".to_string(), text_attrs)]),
        blob: Some(Blob::inline("text/plain; charset=UTF-8", b"This is contents!")),
        ..ActivityVersion::stub(DOC_3, "1").with_label(LANG_ANY, "some document")
    };

    vec![project, rnd, doc]
}

fn member() -> Participator {
    let mut person = Person {
        given_name: Some("Sam".to_string()),
        family_name: Some("Example".to_string()),
        ..Default::default()
    };
    person
        .extensions
        .insert("entityRef".to_string(), json!("viwi.eu/entities/sam.example"));
    Participator::Person(person)
}

fn lead() -> Participation {
    Participation::new(member(), [ROLE_LEAD])
}

fn project_attrs(budget: f64) -> BTreeMap<String, AttributeSet> {
    let mut set = AttributeSet {
        manifest: Some(AttributeSetManifest {
            id: Some(PROJECT_MANIFEST.to_string()),
        }),
        ..Default::default()
    };
    set.attributes.insert(
        "totalBudget".to_string(),
        json!({"currency": "EUR", "amount": budget}),
    );
    set.attributes
        .insert("priorityClass".to_string(), json!("normal"));
    BTreeMap::from([("projo-attrs".to_string(), set)])
}
