//! MusicXML export of a sonified [`Tune`].
//!
//! Each chord becomes one quarter note per part in 4/4 time; each output channel
//! becomes a part carrying its General MIDI program.

use crate::sound::types::{Pitch, Tune, DEFAULT_INSTRUMENTS};

const BEATS_PER_MEASURE: usize = 4;

/// Velocity that MusicXML treats as 100% (forte).
const FORTE_VELOCITY: f32 = 90.0;

/// Convert a Tune to a MusicXML partwise score using the default instruments.
pub fn tune_to_musicxml(tune: &Tune, title: &str) -> String {
    tune_to_musicxml_with(tune, title, &DEFAULT_INSTRUMENTS)
}

/// Convert a Tune to MusicXML, taking the GM program of channel `c` from
/// `instruments[c]` (acoustic grand piano when missing).
pub fn tune_to_musicxml_with(tune: &Tune, title: &str, instruments: &[u8]) -> String {
    let mut xml = String::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 4.0 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">"#);
    xml.push('\n');
    xml.push_str(r#"<score-partwise version="4.0">"#);
    xml.push('\n');

    xml.push_str("  <work>\n");
    xml.push_str(&format!("    <work-title>{}</work-title>\n", escape_xml(title)));
    xml.push_str("  </work>\n");

    // an empty tune still gets one part of rests
    let channels = tune.channel_span().max(1);

    xml.push_str("  <part-list>\n");
    for channel in 0..channels {
        let program = instruments.get(channel).copied().unwrap_or(0);
        xml.push_str(&score_part_xml(channel, program));
    }
    xml.push_str("  </part-list>\n");

    let measures = tune.chord_count().div_ceil(BEATS_PER_MEASURE).max(1);
    for channel in 0..channels {
        xml.push_str(&format!("  <part id=\"P{}\">\n", channel + 1));
        for measure in 0..measures {
            xml.push_str(&measure_xml(tune, channel, measure));
        }
        xml.push_str("  </part>\n");
    }

    xml.push_str("</score-partwise>\n");
    xml
}

fn part_name(channel: usize) -> String {
    match channel {
        0 => "Red".to_string(),
        1 => "Green".to_string(),
        2 => "Blue".to_string(),
        n => format!("Channel {}", n + 1),
    }
}

fn score_part_xml(channel: usize, program: u8) -> String {
    let id = channel + 1;
    let mut xml = String::new();
    xml.push_str(&format!("    <score-part id=\"P{}\">\n", id));
    xml.push_str(&format!("      <part-name>{}</part-name>\n", part_name(channel)));
    xml.push_str(&format!("      <midi-instrument id=\"P{}-I1\">\n", id));
    // 1-based in MusicXML
    xml.push_str(&format!("        <midi-channel>{}</midi-channel>\n", id));
    xml.push_str(&format!(
        "        <midi-program>{}</midi-program>\n",
        program as u16 + 1
    ));
    xml.push_str("      </midi-instrument>\n");
    xml.push_str("    </score-part>\n");
    xml
}

fn measure_xml(tune: &Tune, channel: usize, measure: usize) -> String {
    let mut xml = String::new();
    xml.push_str(&format!("    <measure number=\"{}\">\n", measure + 1));

    if measure == 0 {
        xml.push_str("      <attributes>\n");
        xml.push_str("        <divisions>1</divisions>\n");
        xml.push_str("        <time>\n");
        xml.push_str(&format!("          <beats>{}</beats>\n", BEATS_PER_MEASURE));
        xml.push_str("          <beat-type>4</beat-type>\n");
        xml.push_str("        </time>\n");
        xml.push_str("        <clef>\n");
        xml.push_str("          <sign>G</sign>\n");
        xml.push_str("          <line>2</line>\n");
        xml.push_str("        </clef>\n");
        xml.push_str("      </attributes>\n");
    }

    for beat in 0..BEATS_PER_MEASURE {
        let note = tune
            .chords()
            .get(measure * BEATS_PER_MEASURE + beat)
            .and_then(|chord| chord.note_on(channel))
            .map(|note| note.normalized())
            .filter(|note| !note.is_null());
        match note {
            Some(note) => xml.push_str(&note_xml(note.pitch, note.velocity)),
            None => xml.push_str(&rest_xml()),
        }
    }

    xml.push_str("    </measure>\n");
    xml
}

fn note_xml(pitch: Pitch, velocity: u8) -> String {
    let (step, alter, octave) = spell(pitch);
    let dynamics = velocity as f32 / FORTE_VELOCITY * 100.0;

    let mut xml = String::new();
    xml.push_str(&format!("      <note dynamics=\"{:.2}\">\n", dynamics));
    xml.push_str("        <pitch>\n");
    xml.push_str(&format!("          <step>{}</step>\n", step));
    if alter != 0 {
        xml.push_str(&format!("          <alter>{}</alter>\n", alter));
    }
    xml.push_str(&format!("          <octave>{}</octave>\n", octave));
    xml.push_str("        </pitch>\n");
    xml.push_str("        <duration>1</duration>\n");
    xml.push_str("        <type>quarter</type>\n");
    xml.push_str("      </note>\n");
    xml
}

fn rest_xml() -> String {
    let mut xml = String::new();
    xml.push_str("      <note>\n");
    xml.push_str("        <rest/>\n");
    xml.push_str("        <duration>1</duration>\n");
    xml.push_str("        <type>quarter</type>\n");
    xml.push_str("      </note>\n");
    xml
}

/// Step, alter and octave of a MIDI pitch, spelled with sharps (60 = C4).
fn spell(pitch: Pitch) -> (&'static str, i8, i16) {
    const STEPS: [(&str, i8); 12] = [
        ("C", 0),
        ("C", 1),
        ("D", 0),
        ("D", 1),
        ("E", 0),
        ("F", 0),
        ("F", 1),
        ("G", 0),
        ("G", 1),
        ("A", 0),
        ("A", 1),
        ("B", 0),
    ];
    let (step, alter) = STEPS[pitch.rem_euclid(12) as usize];
    (step, alter, pitch.div_euclid(12) - 1)
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
