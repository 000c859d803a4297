//! Static menu catalog.
//!
//! Each menu's option set is the sole source of truth for valid button
//! text at that step. Labels are matched case-sensitively and exactly;
//! anything else is an invalid choice and re-shows the menu.

/// A fixed menu: title, prompt, and its ordered option labels.
#[derive(Debug, Clone, Copy)]
pub struct Menu {
    pub title: &'static str,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
    pub footer: Option<&'static str>,
}

impl Menu {
    /// Whether `text` is one of this menu's option labels.
    pub fn contains(&self, text: &str) -> bool {
        self.options.contains(&text)
    }

    /// Render the menu as a WhatsApp text message.
    pub fn render(&self) -> String {
        let mut out = format!("*{}*\n{}", self.title, self.prompt);
        for opt in self.options {
            out.push_str("\n- ");
            out.push_str(opt);
        }
        if let Some(footer) = self.footer {
            out.push('\n');
            out.push_str(footer);
        }
        out
    }
}

/// The label shared by every sub-menu for stepping one state back.
pub const BACK: &str = "KEMBALI";

/// Top-level menu, shown on first contact and after every reset.
pub const MAIN: Menu = Menu {
    title: "📌 MENU UTAMA",
    prompt: "Mohon pilih menu berikut 👇",
    options: &["TOP UP", "PESAN PRIBADI", "IZIN CALLING"],
    footer: None,
};

/// Top-up nominal selection.
pub const TOPUP_NOMINAL: Menu = Menu {
    title: "💰 TOP UP",
    prompt: "Silakan pilih nominal Top Up 👇",
    options: &["150K", "200K", "300K", "500K", "1/2", "1", BACK],
    footer: Some("Pilih KEMBALI untuk kembali ke menu utama."),
};

/// Payment method for the chosen nominal.
pub const TOPUP_CONFIRM: Menu = Menu {
    title: "💳 PEMBAYARAN",
    prompt: "Silakan pilih metode pembayaran 👇",
    options: &["BAYAR", "BON", BACK],
    footer: Some("Pilih KEMBALI untuk mengganti nominal."),
};

/// Personal-request category selection.
pub const PERSONAL_CATEGORY: Menu = Menu {
    title: "✉️ PESAN PRIBADI",
    prompt: "Silakan pilih jenis pesan pribadi 👇",
    options: &["BON", "GADAI", "GADAI HP", "TEBUS GADAI", "LAIN-LAIN", BACK],
    footer: None,
};
