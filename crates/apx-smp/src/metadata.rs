//! # Service Metadata Parser
//!
//! Turns the XML returned by an SMP into a [`ServiceMetadataDocument`] and
//! implements the two selection rules applied to it.
//!
//! ## Accepted documents
//!
//! ```text
//! SignedServiceMetadata            (or a bare ServiceMetadata)
//! └── ServiceMetadata
//!     └── ServiceInformation       (Redirect is reported, not followed)
//!         ├── ids:ParticipantIdentifier @scheme
//!         ├── ids:DocumentIdentifier @scheme
//!         └── ProcessList          (at least one Process)
//!             └── Process
//!                 ├── ids:ProcessIdentifier @scheme
//!                 └── ServiceEndpointList   (at least one Endpoint)
//!                     └── Endpoint @transportProfile
//!                         ├── wsa:EndpointReference/wsa:Address
//!                         ├── Certificate   (base64 DER)
//!                         └── ...optional descriptive elements
//! ```
//!
//! Elements are matched by namespace and local name. DTDs are rejected by
//! the parser.
//!
//! ## Selection asymmetry
//!
//! [`resolve_endpoint_address`] takes the first endpoint of the first
//! process without looking at the requested process, while
//! [`resolve_certificate`] filters by process. Both rules are kept as they
//! are for wire compatibility with existing access points.

use apx_core::{DocumentTypeId, ParticipantId, ProcessId};
use base64::Engine;
use roxmltree::{Document, Node};
use url::Url;

use crate::error::MalformedMetadataError;

/// SMP publishing namespace.
pub const SMP_NS: &str = "http://busdox.org/serviceMetadata/publishing/1.0/";
/// BusDox identifier namespace.
pub const IDS_NS: &str = "http://busdox.org/transport/identifiers/1.0/";
/// WS-Addressing namespace.
pub const WSA_NS: &str = "http://www.w3.org/2005/08/addressing";

/// Parsed service metadata. Ephemeral: produced per lookup, consumed by
/// selection, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMetadataDocument {
    /// Participant named in `ServiceInformation`.
    pub participant: ParticipantId,
    /// Document type named in `ServiceInformation`.
    pub document_type: DocumentTypeId,
    /// Processes in document order.
    pub processes: Vec<ProcessEntry>,
    /// Whether the document came wrapped in `SignedServiceMetadata`.
    pub signed: bool,
}

/// One `Process` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// `ProcessIdentifier` of this process.
    pub process_id: ProcessId,
    /// Endpoints in document order.
    pub endpoints: Vec<EndpointEntry>,
}

/// One `Endpoint` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointEntry {
    /// `transportProfile` attribute, e.g. `busdox-transport-as2-ver1p0`.
    pub transport_profile: String,
    /// `wsa:EndpointReference/wsa:Address`.
    pub address: Url,
    /// DER bytes decoded from the base64 `Certificate` element.
    pub certificate: Vec<u8>,
    /// `RequireBusinessLevelSignature`; `false` when absent.
    pub require_business_level_signature: bool,
    /// `MinimumAuthenticationLevel`, verbatim.
    pub minimum_authentication_level: Option<String>,
    /// `ServiceActivationDate`, verbatim.
    pub service_activation_date: Option<String>,
    /// `ServiceExpirationDate`, verbatim.
    pub service_expiration_date: Option<String>,
    /// `ServiceDescription`.
    pub service_description: Option<String>,
    /// `TechnicalContactUrl`.
    pub technical_contact_url: Option<String>,
}

impl ServiceMetadataDocument {
    /// The process whose identifier equals `process` in scheme and value.
    pub fn process(&self, process: &ProcessId) -> Option<&ProcessEntry> {
        self.processes.iter().find(|p| &p.process_id == process)
    }
}

/// Parse SMP XML into a [`ServiceMetadataDocument`].
pub fn parse_metadata(xml: &str) -> Result<ServiceMetadataDocument, MalformedMetadataError> {
    let doc = Document::parse(xml).map_err(|e| MalformedMetadataError::Xml(e.to_string()))?;
    let root = doc.root_element();

    let (service_metadata, signed) = if is(root, SMP_NS, "SignedServiceMetadata") {
        (
            required_child(root, SMP_NS, "ServiceMetadata", "SignedServiceMetadata")?,
            true,
        )
    } else if is(root, SMP_NS, "ServiceMetadata") {
        (root, false)
    } else {
        return Err(MalformedMetadataError::UnexpectedRoot {
            namespace: root.tag_name().namespace().unwrap_or_default().to_string(),
            name: root.tag_name().name().to_string(),
        });
    };

    if let Some(redirect) = child(service_metadata, SMP_NS, "Redirect") {
        return Err(MalformedMetadataError::Redirect(
            redirect.attribute("href").unwrap_or_default().to_string(),
        ));
    }

    let info = required_child(service_metadata, SMP_NS, "ServiceInformation", "ServiceMetadata")?;

    let participant = identifier(info, "ParticipantIdentifier", "ServiceInformation", |s, v| {
        ParticipantId::new(s, v)
    })?;
    let document_type = identifier(info, "DocumentIdentifier", "ServiceInformation", |s, v| {
        DocumentTypeId::new(s, v)
    })?;

    let process_list = required_child(info, SMP_NS, "ProcessList", "ServiceInformation")?;
    let processes = children(process_list, SMP_NS, "Process")
        .map(parse_process)
        .collect::<Result<Vec<_>, _>>()?;
    if processes.is_empty() {
        return Err(MalformedMetadataError::Empty("ProcessList"));
    }

    Ok(ServiceMetadataDocument {
        participant,
        document_type,
        processes,
        signed,
    })
}

/// Address of the first endpoint of the first process.
///
/// Deliberately ignores the requested process and document type; the SMP
/// is trusted to have scoped its answer.
pub fn resolve_endpoint_address(
    metadata: &ServiceMetadataDocument,
) -> Result<&EndpointEntry, MalformedMetadataError> {
    metadata
        .processes
        .first()
        .ok_or(MalformedMetadataError::Empty("ProcessList"))?
        .endpoints
        .first()
        .ok_or(MalformedMetadataError::Empty("ServiceEndpointList"))
}

/// Certificate of the first endpoint of the first process matching
/// `process`. `None` when no process matches; that is not an error.
pub fn resolve_certificate<'a>(
    metadata: &'a ServiceMetadataDocument,
    process: &ProcessId,
) -> Option<&'a [u8]> {
    metadata
        .process(process)?
        .endpoints
        .first()
        .map(|e| e.certificate.as_slice())
}

fn parse_process(node: Node<'_, '_>) -> Result<ProcessEntry, MalformedMetadataError> {
    let process_id = identifier(node, "ProcessIdentifier", "Process", |s, v| ProcessId::new(s, v))?;
    let list = required_child(node, SMP_NS, "ServiceEndpointList", "Process")?;
    let endpoints = children(list, SMP_NS, "Endpoint")
        .map(parse_endpoint)
        .collect::<Result<Vec<_>, _>>()?;
    if endpoints.is_empty() {
        return Err(MalformedMetadataError::Empty("ServiceEndpointList"));
    }
    Ok(ProcessEntry {
        process_id,
        endpoints,
    })
}

fn parse_endpoint(node: Node<'_, '_>) -> Result<EndpointEntry, MalformedMetadataError> {
    let transport_profile = node
        .attribute("transportProfile")
        .ok_or(MalformedMetadataError::MissingAttribute {
            attribute: "transportProfile",
            element: "Endpoint",
        })?
        .to_string();

    let reference = required_child(node, WSA_NS, "EndpointReference", "Endpoint")?;
    let raw_address = required_child(reference, WSA_NS, "Address", "EndpointReference")?;
    let address = Url::parse(text(raw_address).trim()).map_err(|e| {
        MalformedMetadataError::InvalidValue {
            element: "Address",
            reason: e.to_string(),
        }
    })?;

    let raw_certificate: String = text(required_child(node, SMP_NS, "Certificate", "Endpoint")?)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let certificate = base64::engine::general_purpose::STANDARD
        .decode(raw_certificate)
        .map_err(|e| MalformedMetadataError::InvalidValue {
            element: "Certificate",
            reason: e.to_string(),
        })?;

    let require_business_level_signature =
        match optional_text(node, "RequireBusinessLevelSignature").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(MalformedMetadataError::InvalidValue {
                    element: "RequireBusinessLevelSignature",
                    reason: format!("{other:?} is not a boolean"),
                })
            }
        };

    Ok(EndpointEntry {
        transport_profile,
        address,
        certificate,
        require_business_level_signature,
        minimum_authentication_level: optional_text(node, "MinimumAuthenticationLevel"),
        service_activation_date: optional_text(node, "ServiceActivationDate"),
        service_expiration_date: optional_text(node, "ServiceExpirationDate"),
        service_description: optional_text(node, "ServiceDescription"),
        technical_contact_url: optional_text(node, "TechnicalContactUrl"),
    })
}

fn identifier<T>(
    parent: Node<'_, '_>,
    name: &'static str,
    parent_name: &'static str,
    build: impl FnOnce(&str, &str) -> Result<T, apx_core::ConfigurationError>,
) -> Result<T, MalformedMetadataError> {
    let node = required_child(parent, IDS_NS, name, parent_name)?;
    let scheme = node
        .attribute("scheme")
        .ok_or(MalformedMetadataError::MissingAttribute {
            attribute: "scheme",
            element: name,
        })?;
    build(scheme, text(node)).map_err(|e| MalformedMetadataError::InvalidValue {
        element: name,
        reason: e.to_string(),
    })
}

// -- roxmltree helpers -----------------------------------------------------

fn is(node: Node<'_, '_>, namespace: &str, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(namespace)
}

fn children<'a, 'input: 'a>(
    parent: Node<'a, 'input>,
    namespace: &'static str,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    parent.children().filter(move |n| is(*n, namespace, name))
}

fn child<'a, 'input>(
    parent: Node<'a, 'input>,
    namespace: &'static str,
    name: &'static str,
) -> Option<Node<'a, 'input>> {
    parent.children().find(|n| is(*n, namespace, name))
}

fn required_child<'a, 'input>(
    parent: Node<'a, 'input>,
    namespace: &'static str,
    name: &'static str,
    parent_name: &'static str,
) -> Result<Node<'a, 'input>, MalformedMetadataError> {
    child(parent, namespace, name).ok_or(MalformedMetadataError::MissingElement {
        element: name,
        parent: parent_name,
    })
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or_default()
}

fn optional_text(parent: Node<'_, '_>, name: &'static str) -> Option<String> {
    child(parent, SMP_NS, name)
        .map(|n| text(n).trim().to_string())
        .filter(|s| !s.is_empty())
}
