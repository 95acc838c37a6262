use fukidashi::{
    CaptionConfig, CaptionLayout, Emphasis, FaceId, FixedMetrics, FontSource, FontSystem, Sizing,
    SpeakerStyle, TextPlacement, layout_caption,
    euclid::default::Size2D,
    fontdb::{self, Family, Query},
    text::HorizontalAlign,
};

const ARTWORK_WIDTH: u32 = 900;
const ARTWORK_HEIGHT: u32 = 1200;

const SCRIPT: &str = "\
[narrator]_Somewhere above the smog layer..._

[alice]Have you seen the *new* condos in Sector 7? They float.
[bob]Gravity is a luxury, Alice.
[alice]That's what the brochure says, *word for word*.

[bob]Then I suppose we should read the \\*fine print\\* before moving in.
[narrator]They did not read the fine print.";

fn query(
    font_system: &FontSystem,
    families: &[Family],
    weight: fontdb::Weight,
    style: fontdb::Style,
) -> Option<FaceId> {
    font_system.query(&Query {
        families,
        weight,
        stretch: fontdb::Stretch::Normal,
        style,
    })
}

/// Builds a speaker from system fonts, using the regular face wherever a
/// variant is missing.
fn system_speaker(font_system: &FontSystem, name: &str, family: Family) -> Option<SpeakerStyle> {
    let families = [family, Family::SansSerif];
    let regular = query(font_system, &families, fontdb::Weight::NORMAL, fontdb::Style::Normal)?;
    let variant = |weight, style| {
        FontSource::Face(query(font_system, &families, weight, style).unwrap_or(regular))
    };

    Some(
        SpeakerStyle::new(name, FontSource::Face(regular))
            .with_variant(Emphasis::Bold, variant(fontdb::Weight::BOLD, fontdb::Style::Normal))
            .with_variant(Emphasis::Italic, variant(fontdb::Weight::NORMAL, fontdb::Style::Italic))
            .with_variant(
                Emphasis::BoldItalic,
                variant(fontdb::Weight::BOLD, fontdb::Style::Italic),
            ),
    )
}

fn print_layout(layout: &CaptionLayout) {
    println!(
        "Words: {}  wrap width: {:.1}px ({:.2}x base)",
        layout.word_count, layout.wrap_width, layout.text_width
    );
    println!(
        "Scale: {:.4}  text height: {:.1}px (target {:.1}px)",
        layout.fit.scale, layout.fit.text_height, layout.fit.target_height
    );
    for (i, text_box) in layout.boxes.iter().enumerate() {
        println!(
            "Box {}: {:.0}x{:.0}, {} line(s)",
            i,
            text_box.width(),
            text_box.height(),
            text_box.line_count()
        );
        for line in text_box.lines() {
            println!("  | {}", line.text());
        }
    }

    match layout.canvas(Size2D::new(ARTWORK_WIDTH, ARTWORK_HEIGHT)) {
        Ok(canvas) => {
            println!(
                "Canvas: {}x{}, artwork at {:?}",
                canvas.size.width, canvas.size.height, canvas.artwork_origin
            );
            for run in layout.positioned_runs(&canvas).iter().take(8) {
                println!(
                    "  {:>6.1},{:>6.1}  {}px  {:?}",
                    run.baseline.x,
                    run.baseline.y,
                    run.resolved.pixel_height(),
                    run.text
                );
            }
        }
        Err(e) => log::error!("Failed to plan canvas: {}", e),
    }
}

#[allow(clippy::unwrap_used)]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // 1. Setup Font System
    let font_system = FontSystem::new();
    font_system.load_system_fonts();

    // 2. Layout config: two columns around the artwork
    let config = CaptionConfig {
        placement: TextPlacement::Split,
        alignment: HorizontalAlign::Left,
        sizing: Sizing::MatchArtwork,
        ..CaptionConfig::default()
    };

    // 3. Describe the speakers, falling back to fixed metrics without fonts
    let speakers: Option<Vec<SpeakerStyle>> = [
        ("narrator", Family::Serif),
        ("alice", Family::SansSerif),
        ("bob", Family::Monospace),
    ]
    .into_iter()
    .map(|(name, family)| system_speaker(&font_system, name, family))
    .collect();

    // 4. Perform Layout
    let layout = match speakers {
        Some(speakers) => font_system
            .layout_caption(SCRIPT, &speakers, &config, Some(ARTWORK_HEIGHT))
            .unwrap(),
        None => {
            log::warn!("No system fonts found, using fixed metrics");
            let mut metrics = FixedMetrics::new();
            let face = metrics.add_face(0.5, 0.3);
            let speakers = ["narrator", "alice", "bob"]
                .map(|name| SpeakerStyle::new(name, FontSource::Face(face)));
            layout_caption(SCRIPT, &speakers, &config, Some(ARTWORK_HEIGHT), &mut metrics).unwrap()
        }
    };

    print_layout(&layout);
}
