//! Body and attachment extraction from a MIME tree

use super::{MimeNode, PartInfo};
use crate::decode::decode_bytes;
use crate::models::Attachment;

/// Text bodies and attachments found in a message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyParts {
    pub body: Option<String>,
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Walk a MIME tree depth-first, descending into embedded messages.
///
/// The last text/plain leaf becomes the body and the last text/html leaf
/// the HTML body, including leaves of a forwarded message. Any node
/// declaring a disposition and a filename is also collected as an
/// attachment, independently of the text assignment.
pub fn walk(root: &MimeNode) -> BodyParts {
    let mut parts = BodyParts::default();
    visit(root, &mut parts);
    parts
}

fn visit(node: &MimeNode, parts: &mut BodyParts) {
    if let Some(attachment) = attachment_for(node) {
        parts.attachments.push(attachment);
    }

    match node {
        MimeNode::Leaf { part, payload } => assign_text(part, payload, parts),
        MimeNode::Multipart { children, .. } => {
            for child in children {
                visit(child, parts);
            }
        }
        MimeNode::Embedded { message, .. } => visit(message, parts),
    }
}

fn assign_text(part: &PartInfo, payload: &[u8], parts: &mut BodyParts) {
    let slot = match part.content_type.as_str() {
        "text/plain" => &mut parts.body,
        "text/html" => &mut parts.html,
        _ => return,
    };
    *slot = Some(decode_bytes(payload, part.charset.as_deref()));
}

fn attachment_for(node: &MimeNode) -> Option<Attachment> {
    let part = node.part();
    if !part.is_attachment() {
        return None;
    }
    let name = part.filename.clone()?;

    Some(match node {
        MimeNode::Leaf { payload, .. } => Attachment::new(name, payload.clone()),
        MimeNode::Multipart { .. } | MimeNode::Embedded { .. } => Attachment::without_payload(name),
    })
}
