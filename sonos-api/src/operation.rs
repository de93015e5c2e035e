use xmltree::Element;

use crate::error::ApiError;
use crate::service::Service;

/// Base trait for all Sonos API operations
///
/// This trait defines the common interface that all Sonos UPnP operations must implement.
/// It provides type safety through associated types and ensures consistent patterns
/// for request/response handling across all operations.
pub trait SonosOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// The UPnP service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Build the XML arguments that go inside the action element of the envelope
    fn build_payload(request: &Self::Request) -> String;

    /// Convert the `<ActionResponse>` element into the typed response
    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError>;
}

/// Read the text of a direct child element
pub(crate) fn child_text(xml: &Element, name: &str) -> Result<String, ApiError> {
    xml.get_child(name)
        .map(|e| e.get_text().map(|t| t.into_owned()).unwrap_or_default())
        .ok_or_else(|| ApiError::ParseError(format!("Missing {} element", name)))
}

/// Read and parse a direct child element
pub(crate) fn child_value<T: std::str::FromStr>(xml: &Element, name: &str) -> Result<T, ApiError> {
    let text = child_text(xml, name)?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::ParseError(format!("Invalid {} value '{}'", name, text)))
}

/// Escape text for use inside a SOAP argument element
pub(crate) fn xml_escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

/// Declare a UPnP operation with minimal boilerplate
///
/// Generates `<Operation>Request` (always carrying `instance_id`), the
/// operation type itself, and its [`SonosOperation`] implementation.
///
/// ```rust,ignore
/// define_operation! {
///     /// Start or resume playback
///     operation: PlayOperation,
///     action: "Play",
///     service: AVTransport,
///     request: { speed: String },
///     response: (),
///     payload: |req| format!("<InstanceID>{}</InstanceID><Speed>{}</Speed>", req.instance_id, req.speed),
///     parse: |_xml| Ok(()),
/// }
///
/// // InstanceID in, nothing out
/// define_operation! {
///     operation: StopOperation,
///     action: "Stop",
///     service: AVTransport,
/// }
/// ```
macro_rules! define_operation {
    (
        $(#[$meta:meta])*
        operation: $op_struct:ident,
        action: $action:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty),* $(,)?
        },
        response: $response_type:ty,
        payload: |$req_param:ident| $payload_expr:expr,
        parse: |$xml_param:ident| $parse_expr:expr $(,)?
    ) => {
        paste::paste! {
            #[doc = concat!("Request for the `", $action, "` action")]
            #[derive(Clone, Debug, PartialEq)]
            pub struct [<$op_struct Request>] {
                pub instance_id: u32,
                $(pub $field: $field_type,)*
            }

            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $op_struct;

            impl $crate::operation::SonosOperation for $op_struct {
                type Request = [<$op_struct Request>];
                type Response = $response_type;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const ACTION: &'static str = $action;

                fn build_payload($req_param: &Self::Request) -> String {
                    $payload_expr
                }

                fn parse_response(
                    $xml_param: &xmltree::Element,
                ) -> Result<Self::Response, $crate::error::ApiError> {
                    $parse_expr
                }
            }
        }
    };

    // Actions that take only an InstanceID and return nothing
    (
        $(#[$meta:meta])*
        operation: $op_struct:ident,
        action: $action:literal,
        service: $service:ident $(,)?
    ) => {
        define_operation! {
            $(#[$meta])*
            operation: $op_struct,
            action: $action,
            service: $service,
            request: {},
            response: (),
            payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
            parse: |_xml| Ok(()),
        }
    };
}
