use argh::FromArgs;
use image::DynamicImage;
use qpaint::{font::charset, ColorFormat, Compression, ImageAsset};
use snafu::{ensure, ResultExt, Snafu};
use std::path::{Path, PathBuf};

/// Converts images and fonts into display assets.
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    ConvertImage(ConvertImage),
    BuildFontAtlas(BuildFontAtlas),
    ConvertFontAtlas(ConvertFontAtlas),
    DecodeImage(DecodeImage),
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("cannot read `{}`", path.display()))]
    MissingInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("`{}` is not a readable image", path.display()))]
    LoadImage {
        path: PathBuf,
        source: image::ImageError,
    },
    #[snafu(display("cannot write `{}`", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot save `{}`", path.display()))]
    SaveImage {
        path: PathBuf,
        source: image::ImageError,
    },
    #[snafu(display("`{}` is not a valid asset", path.display()))]
    ReadAsset {
        path: PathBuf,
        source: qpaint::AssetError,
    },
    #[snafu(display("conversion failed"))]
    Convert { source: qpaint::Error },
    #[snafu(display("glyph selection is empty, pass --glyphs or keep the ascii block"))]
    NoGlyphs,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Cli { command } = argh::from_env();

    match command {
        Command::ConvertImage(options) => convert_image(options)?,
        Command::BuildFontAtlas(options) => build_font_atlas(options)?,
        Command::ConvertFontAtlas(options) => convert_font_atlas(options)?,
        Command::DecodeImage(options) => decode_image(options)?,
    }

    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).context(MissingInputSnafu { path })
}

fn load_image(path: &Path) -> Result<DynamicImage, CliError> {
    let bytes = read(path)?;
    image::load_from_memory(&bytes).context(LoadImageSnafu { path })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).context(WriteOutputSnafu { path })
}

/// Converts an image into an image asset.
#[derive(FromArgs)]
#[argh(subcommand, name = "convert-image")]
struct ConvertImage {
    /// pixel format (rgb565, pal256, pal16, pal4, pal2, mono256, mono16, mono4, mono2)
    #[argh(option)]
    format: ColorFormat,

    /// compression (none, chunked, rle)
    #[argh(option, default = "Compression::None")]
    compression: Compression,

    /// uncompressed bytes per chunk, only used with chunked compression
    #[argh(option, default = "qpaint::DEFAULT_CHUNK_SIZE")]
    chunk_size: u32,

    /// the input file, any of PNG, BMP, JPEG, or TIFF
    #[argh(positional)]
    input: PathBuf,
    /// the output file
    #[argh(positional)]
    output: PathBuf,
}

fn convert_image(options: ConvertImage) -> Result<(), CliError> {
    let ConvertImage {
        format,
        compression,
        chunk_size,
        input,
        output,
    } = options;

    let image = load_image(&input)?;
    tracing::info!(
        "Converting {}x{} image `{}` to {format}",
        image.width(),
        image.height(),
        input.display()
    );

    let asset = qpaint::convert_image(&image, format, compression, chunk_size)
        .context(ConvertSnafu)?;
    let bytes = asset.to_bytes();
    write(&output, &bytes)?;

    tracing::info!(
        "Written {} bytes ({} bytes of pixels, {compression:?}) to `{}`",
        bytes.len(),
        asset.byte_count,
        output.display()
    );
    Ok(())
}

/// Renders glyphs of a TrueType or OpenType font into an editable atlas image.
#[derive(FromArgs)]
#[argh(subcommand, name = "build-font-atlas")]
struct BuildFontAtlas {
    /// font size in pixels per em
    #[argh(option, default = "12.0")]
    size: f32,

    /// leave out the printable ascii block
    #[argh(switch)]
    no_ascii: bool,

    /// include the extended ascii block (0x80 to 0xFE)
    #[argh(switch)]
    ext_ascii: bool,

    /// additional glyphs to include
    #[argh(option, default = "String::new()")]
    glyphs: String,

    /// the font file
    #[argh(positional)]
    font: PathBuf,
    /// the output image, PNG is recommended
    #[argh(positional)]
    output: PathBuf,
}

fn build_font_atlas(options: BuildFontAtlas) -> Result<(), CliError> {
    let BuildFontAtlas {
        size,
        no_ascii,
        ext_ascii,
        glyphs,
        font,
        output,
    } = options;

    let glyphs = charset(!no_ascii, ext_ascii, &glyphs);
    ensure!(!glyphs.is_empty(), NoGlyphsSnafu);

    let font_data = read(&font)?;
    tracing::info!(
        "Rendering {} glyphs of `{}` at {size}px",
        glyphs.len(),
        font.display()
    );

    let atlas = qpaint::build_font_atlas(&font_data, size, &glyphs).context(ConvertSnafu)?;
    atlas.save(&output).context(SaveImageSnafu { path: &output })?;

    tracing::info!(
        "Written {}x{} atlas to `{}`",
        atlas.width(),
        atlas.height(),
        output.display()
    );
    Ok(())
}

/// Converts a font atlas into a font asset.
#[derive(FromArgs)]
#[argh(subcommand, name = "convert-font-atlas")]
struct ConvertFontAtlas {
    /// pixel format (rgb565, pal256, pal16, pal4, pal2, mono256, mono16, mono4, mono2)
    #[argh(option)]
    format: ColorFormat,

    /// the atlas was built without the printable ascii block
    #[argh(switch)]
    no_ascii: bool,

    /// the atlas was built with the extended ascii block
    #[argh(switch)]
    ext_ascii: bool,

    /// additional glyphs the atlas was built with
    #[argh(option, default = "String::new()")]
    glyphs: String,

    /// the atlas image
    #[argh(positional)]
    atlas: PathBuf,
    /// the output file
    #[argh(positional)]
    output: PathBuf,
}

fn convert_font_atlas(options: ConvertFontAtlas) -> Result<(), CliError> {
    let ConvertFontAtlas {
        format,
        no_ascii,
        ext_ascii,
        glyphs,
        atlas,
        output,
    } = options;

    let glyphs = charset(!no_ascii, ext_ascii, &glyphs);
    ensure!(!glyphs.is_empty(), NoGlyphsSnafu);

    let image = load_image(&atlas)?;
    tracing::info!(
        "Converting {} glyphs of `{}` to {format}",
        glyphs.len(),
        atlas.display()
    );

    let font = qpaint::convert_font_atlas(&image, &glyphs, format).context(ConvertSnafu)?;
    let bytes = font.to_bytes();
    write(&output, &bytes)?;

    tracing::info!(
        "Written {} bytes ({} ascii, {} unicode glyphs, {}px tall) to `{}`",
        bytes.len(),
        font.table.ascii_count(),
        font.table.unicode_count(),
        font.glyph_height,
        output.display()
    );
    Ok(())
}

/// Renders an image asset back to a regular image, for checking a conversion.
#[derive(FromArgs)]
#[argh(subcommand, name = "decode-image")]
struct DecodeImage {
    /// the image asset
    #[argh(positional)]
    input: PathBuf,
    /// the output image, format chosen by extension
    #[argh(positional)]
    output: PathBuf,
}

fn decode_image(options: DecodeImage) -> Result<(), CliError> {
    let DecodeImage { input, output } = options;

    let bytes = read(&input)?;
    let asset = ImageAsset::from_bytes(&bytes).context(ReadAssetSnafu { path: &input })?;
    tracing::info!(
        "Decoding {}x{} {} image `{}`",
        asset.width,
        asset.height,
        asset.format,
        input.display()
    );

    let image = qpaint::preview_image(&asset).context(ConvertSnafu)?;
    image.save(&output).context(SaveImageSnafu { path: &output })?;

    tracing::info!("Written image to `{}`", output.display());
    Ok(())
}
