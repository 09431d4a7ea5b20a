//! Versioned, line-oriented session files.
//!
//! A session starts with a version number (floored to an integer) that
//! selects a decoder. Every known version can be read; only the current one
//! is written. Decoding stops at the first malformed line and returns no
//! partial model.

mod raw;
mod reader;
mod v1;
mod v2;
mod v3;

pub(crate) use reader::{LineReader, Tokens};

use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::model::ModelStore;
use crate::options::SessionOptions;

/// Version written by [`write_session`].
pub const SESSION_VERSION: i64 = v3::VERSION;

/// A model together with the options saved alongside it.
#[derive(Debug, Default)]
pub struct Session {
    pub model: ModelStore,
    pub options: SessionOptions,
}

type Decoder = fn(&mut LineReader<'_>) -> std::result::Result<Session, SessionError>;

const DECODERS: [(i64, Decoder); 3] = [(1, v1::decode), (2, v2::decode), (v3::VERSION, v3::decode)];

fn read_version(reader: &mut LineReader<'_>) -> std::result::Result<i64, SessionError> {
    let mut t = reader.tokens("version")?;
    let raw = t.f64("version")?;
    t.finish()?;
    if !raw.is_finite() {
        return Err(reader.malformed(format!("invalid version {raw}")));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(raw.floor() as i64)
}

/// Decodes a session from text.
///
/// # Errors
///
/// Returns the first problem found, with its line number.
pub fn decode_session(text: &str) -> std::result::Result<Session, SessionError> {
    let mut reader = LineReader::new(text);
    let version = read_version(&mut reader)?;
    let (_, decode) = DECODERS
        .iter()
        .find(|(v, _)| *v == version)
        .ok_or(SessionError::UnsupportedVersion(version))?;
    let session = decode(&mut reader)?;
    if !reader.is_exhausted() {
        return Err(reader.malformed("unexpected content after the option blocks".to_string()));
    }
    debug!(version, "session decoded");
    Ok(session)
}

/// Reads and decodes a whole session stream.
///
/// # Errors
///
/// Returns an error if the stream cannot be read or decoded.
pub fn read_session(mut input: impl Read) -> Result<Session> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    Ok(decode_session(&text)?)
}

/// Writes `session` in the current layout. Resets model IDs first.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_session(session: &mut Session, out: &mut impl Write) -> Result<()> {
    session.model.reset_ids();
    v3::encode(&session.model, &session.options, out)
}

/// Writes `session` to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_session(session: &mut Session, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(fs::File::create(path)?);
    write_session(session, &mut out)?;
    out.flush()?;
    info!(path = %path.display(), nodes = session.model.node_count(), "session saved");
    Ok(())
}

/// Reads a session file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_session(path: impl AsRef<Path>) -> Result<Session> {
    let path = path.as_ref();
    let session = decode_session(&fs::read_to_string(path)?)?;
    info!(path = %path.display(), nodes = session.model.node_count(), "session loaded");
    Ok(session)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point2, Point3};
    use crate::model::{
        Calibration, Color, GroupData, SectionContent, SectionData, SectionOrientation, Voi,
    };
    use crate::test_support::{cross_section, init_tracing, off, snapshot, Fixture};

    fn sample() -> Session {
        let mut fx = Fixture::new();
        let cross = fx.store.add_section(cross_section());
        let depth = fx.store.add_section(
            SectionData::new(
                SectionOrientation::Depth,
                SectionContent::Image {
                    path: "maps/level 3.png".into(),
                },
            )
            .with_calibration(Calibration::new(
                [Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)],
                [Point3::new(0.0, 0.0, -5.0), Point3::new(1.0, 1.0, -5.0)],
            ))
            .unwrap(),
        );
        fx.store.add_section(SectionData::new(
            SectionOrientation::Cross,
            SectionContent::Snapshot {
                path: "snap.png".into(),
            },
        ));
        let other = fx
            .store
            .add_group(GroupData::new("sand stone", Color::new(1, 2, 3)));

        let a = fx.on_section(cross, 1.5, 2.0);
        let b = fx.on_section(depth, 3.0, 4.0);
        let c = fx.node(0.1, 0.2, 0.3);
        let d = fx.store.add_node(off(other, -1.0, 2.0, 1e-9).with_boundary(true)).unwrap();
        fx.facet(&[a, b, c]);
        fx.facet(&[b, c, d]);
        fx.store
            .add_facet(crate::model::FacetData::new(vec![c, d], other).with_boundary(true))
            .unwrap();
        fx.region(cross, 5.0, 5.0, false);
        fx.region(depth, 6.0, 7.0, true);
        fx.store.set_voi(Some(Voi::new((-1.0, 1.0), (-2.0, 2.0), (-3.0, 3.0))));

        let mut session = Session {
            model: fx.store,
            ..Session::default()
        };
        session.options.interaction.picking_distance = 0.75;
        session.options.file_io.precision = Some(4);
        session
    }

    fn encode(session: &mut Session) -> String {
        let mut out = Vec::new();
        write_session(session, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn current_version_round_trips() {
        init_tracing();
        let mut original = sample();
        let text = encode(&mut original);
        assert!(text.starts_with("3\n"));
        let mut decoded = decode_session(&text).unwrap();
        assert_eq!(snapshot(&decoded.model), snapshot(&original.model));
        assert_eq!(decoded.options, original.options);
        let contents: Vec<_> = decoded
            .model
            .sections()
            .iter()
            .map(|(_, s)| s.content().clone())
            .collect();
        assert_eq!(
            contents[1],
            SectionContent::Image {
                path: "maps/level 3.png".into()
            }
        );
        assert_eq!(decoded.model.voi(), original.model.voi());
        assert_eq!(encode(&mut decoded), text);
    }

    #[test]
    fn ids_match_after_reset() {
        let mut original = sample();
        let text = encode(&mut original);
        let mut decoded = decode_session(&text).unwrap();
        decoded.model.reset_ids();
        for ((_, a), (_, b)) in original.model.facets().zip(decoded.model.facets()) {
            let ids = |m: &ModelStore, f: &crate::model::FacetData| -> Vec<usize> {
                f.nodes().iter().map(|&n| m.node(n).unwrap().id()).collect()
            };
            assert_eq!(ids(&original.model, a), ids(&decoded.model, b));
            assert_eq!(a.id(), b.id());
        }
    }

    #[test]
    fn empty_model_round_trips() {
        let mut session = Session::default();
        let text = encode(&mut session);
        let decoded = decode_session(&text).unwrap();
        assert!(!decoded.model.has_nodes());
        assert!(decoded.model.voi().is_none());
    }

    #[test]
    fn version_is_floored_and_checked() {
        let mut session = sample();
        let text = encode(&mut session);
        let fractional = text.replacen('3', "3.9", 1);
        assert!(decode_session(&fractional).is_ok());
        assert_eq!(
            decode_session("7\n").unwrap_err(),
            SessionError::UnsupportedVersion(7)
        );
        assert!(matches!(
            decode_session("three\n"),
            Err(SessionError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn inconsistent_node_facets_are_rejected() {
        let mut session = sample();
        let text = encode(&mut session);
        // Node c belongs to all three facets; claim it belongs to one.
        let tampered = text.replacen("\n3 0 1 2\n", "\n1 0\n", 1);
        assert_ne!(tampered, text);
        assert!(matches!(
            decode_session(&tampered),
            Err(SessionError::InconsistentLink { .. })
        ));
    }

    #[test]
    fn facet_sections_must_match_nodes() {
        let mut session = sample();
        let text = encode(&mut session);
        let tampered = text.replacen("0 0 3 0 1 2 2 0 1", "0 0 3 0 1 2 1 0", 1);
        assert_ne!(tampered, text);
        assert!(matches!(
            decode_session(&tampered),
            Err(SessionError::InconsistentLink { .. })
        ));
    }

    #[test]
    fn awkward_names_and_paths_round_trip() {
        let names = ["  padded ", "two\nlines", "say \"hi\" \\ tab\t", "# not a comment", ""];
        let mut fx = Fixture::new();
        for name in names {
            fx.store.add_group(GroupData::new(name, Color::default()));
        }
        fx.store.add_section(SectionData::new(
            SectionOrientation::Depth,
            SectionContent::Image {
                path: " odd\r\nname.png ".into(),
            },
        ));
        let mut session = Session {
            model: fx.store,
            ..Session::default()
        };
        let decoded = decode_session(&encode(&mut session)).unwrap();
        let read: Vec<&str> = decoded.model.groups().iter().map(|(_, g)| g.name()).collect();
        assert_eq!(&read[1..], &names[..]);
        let (_, section) = decoded.model.sections().iter().next().unwrap();
        assert_eq!(
            section.content(),
            &SectionContent::Image {
                path: " odd\r\nname.png ".into()
            }
        );
    }

    #[test]
    fn model_rejections_carry_the_line() {
        let mut session = sample();
        let text = encode(&mut session);
        let degenerate = "0 0 100 100 0 0 0 100 0 0";
        let tampered = text.replacen("0 0 100 100 0 0 0 100 0 -100", degenerate, 1);
        assert_ne!(tampered, text);
        assert!(matches!(
            decode_session(&tampered),
            Err(SessionError::Rejected {
                source: crate::error::ModelError::DegenerateCalibration,
                ..
            })
        ));
    }

    #[test]
    fn trailing_content_is_rejected() {
        let mut session = sample();
        let text = encode(&mut session) + "surprise\n";
        assert!(matches!(
            decode_session(&text),
            Err(SessionError::Malformed { .. })
        ));
    }

    #[test]
    fn files_round_trip() {
        let dir = std::env::temp_dir().join(format!("plcmesh-session-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.plc");
        let mut session = sample();
        save_session(&mut session, &path).unwrap();
        let loaded = load_session(&path).unwrap();
        assert_eq!(snapshot(&loaded.model), snapshot(&session.model));
        fs::remove_dir_all(&dir).unwrap();
    }
}
