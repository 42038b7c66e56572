use crate::output::print_json;
use crate::session::Session;
use routecap_core::portal::PortalTransform;
use routecap_core::types::Coord;

pub fn run(session: &Session, x: i32, y: i32, json: bool) -> anyhow::Result<()> {
    let transform = &session.config.portal;
    let input = Coord::new(x, y);
    let output = transform.apply(input)?;

    if json {
        #[derive(serde::Serialize)]
        struct PortalOutput<'a> {
            input: Coord,
            output: Coord,
            transform: &'a PortalTransform,
        }
        return print_json(&PortalOutput {
            input,
            output,
            transform,
        });
    }

    print!(
        "{input} @ {} -> {output} @ {}",
        transform.source, transform.destination
    );
    if transform.rotate {
        println!(" (rotated, W={})", transform.rotation_width());
    } else {
        println!();
    }
    Ok(())
}
