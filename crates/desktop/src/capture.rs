use bpwatch_core::Region;

use crate::command::run_tool;
use crate::error::DesktopError;

/// ImageMagick geometry for a region: `WxH+X+Y`.
pub fn crop_geometry(region: Region) -> String {
    format!("{}x{}{:+}{:+}", region.width, region.height, region.x, region.y)
}

/// Grabs a region of the root window as PNG bytes.
pub async fn capture_region(region: Region) -> Result<Vec<u8>, DesktopError> {
    let geometry = crop_geometry(region);
    let png = run_tool("import", ["-window", "root", "-crop", geometry.as_str(), "png:-"]).await?;
    tracing::debug!(geometry = %geometry, bytes = png.len(), "Captured screen region");
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_uses_signed_offsets() {
        let region = Region { x: 10, y: 120, width: 800, height: 400 };
        assert_eq!(crop_geometry(region), "800x400+10+120");
        let region = Region { x: -5, y: 0, width: 1, height: 2 };
        assert_eq!(crop_geometry(region), "1x2-5+0");
    }
}
