//! Native windows for the match visualizations.

use eframe::egui;
use image::RgbImage;

use crate::error::LocateResult;

struct Panel {
    title: String,
    image: RgbImage,
    texture: Option<egui::TextureHandle>,
    open: bool,
}

impl Panel {
    fn texture(&mut self, ctx: &egui::Context) -> egui::TextureHandle {
        let image = &self.image;
        self.texture
            .get_or_insert_with(|| {
                let (w, h) = image.dimensions();
                let color = egui::ColorImage::from_rgb([w as usize, h as usize], image.as_raw());
                ctx.load_texture(format!("panel_{w}x{h}"), color, egui::TextureOptions::LINEAR)
            })
            .clone()
    }
}

struct MatchViewer {
    panels: Vec<Panel>,
}

fn key_pressed(ctx: &egui::Context) -> bool {
    ctx.input(|i| {
        i.events
            .iter()
            .any(|e| matches!(e, egui::Event::Key { pressed: true, .. }))
    })
}

fn show_image(ui: &mut egui::Ui, texture: &egui::TextureHandle) {
    ui.image((texture.id(), texture.size_vec2()));
}

impl eframe::App for MatchViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut quit = key_pressed(ctx);

        let (first, rest) = self.panels.split_at_mut(1);
        let root = &mut first[0];
        let texture = root.texture(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| show_image(ui, &texture));

        for (idx, panel) in rest.iter_mut().enumerate() {
            if !panel.open {
                continue;
            }
            let texture = panel.texture(ctx);
            let size = texture.size_vec2();
            ctx.show_viewport_immediate(
                egui::ViewportId::from_hash_of(("match_panel", idx)),
                egui::ViewportBuilder::default()
                    .with_title(&panel.title)
                    .with_inner_size([size.x, size.y]),
                |ctx, _class| {
                    egui::CentralPanel::default()
                        .frame(egui::Frame::NONE)
                        .show(ctx, |ui| show_image(ui, &texture));
                    if key_pressed(ctx) {
                        quit = true;
                    }
                    if ctx.input(|i| i.viewport().close_requested()) {
                        panel.open = false;
                    }
                },
            );
        }

        if quit {
            ctx.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Close);
        }
    }
}

/// Shows one window per `(title, image)` and blocks until a key is pressed in
/// any of them or the first window is closed.
pub fn show(panels: Vec<(String, RgbImage)>) -> LocateResult<()> {
    let Some((first_title, first)) = panels.first() else {
        return Ok(());
    };
    let (w, h) = first.dimensions();
    let title = first_title.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&title)
            .with_inner_size([w as f32, h as f32]),
        ..Default::default()
    };

    let viewer = MatchViewer {
        panels: panels
            .into_iter()
            .map(|(title, image)| Panel {
                title,
                image,
                texture: None,
                open: true,
            })
            .collect(),
    };

    eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(viewer))))?;
    Ok(())
}
