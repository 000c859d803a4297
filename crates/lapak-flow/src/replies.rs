//! Fixed reply texts outside the menus themselves.

/// Prefix put in front of a re-shown menu after an unrecognized choice.
pub const INVALID_CHOICE: &str = "❌ Pilihan tidak valid.";

/// Call-permission request recorded; admin will confirm out-of-band.
pub const CALL_RECORDED: &str =
    "✅ Permintaan izin calling sudah dicatat.\nSilakan tunggu konfirmasi admin.";

/// Top-up order recorded, waiting for the admin.
pub const TOPUP_PENDING: &str =
    "✅ Permintaan Top Up sudah dicatat.\nSilakan tunggu admin menyetujui.";

/// Personal request recorded, waiting for the admin.
pub const PERSONAL_PENDING: &str =
    "✅ Pesan Anda sudah dicatat.\nSilakan tunggu admin merespon.";

/// Nudge for customers who keep typing while an order is pending.
pub const PENDING_REMINDER: &str =
    "⏳ Permintaan Anda masih menunggu admin.\nMohon tunggu sebentar lagi.";

/// Leaving the call-permission state back to the main menu.
pub const BACK_TO_MENU: &str = "Kembali ke menu utama.";

/// Sweeper notice: call-permission request sat too long.
pub const CALL_EXPIRED: &str = "⌛ Sesi Anda berakhir otomatis.\nKembali ke menu utama.";

/// Sweeper notice: pending order sat too long.
pub const ORDER_EXPIRED: &str =
    "⌛ Sesi Anda ditutup otomatis karena tidak ada respon.\nKembali ke menu utama.";

/// Sent after rejecting a voice/video call.
pub const CALL_REJECTED: &str = "❌ Maaf, panggilan tidak diizinkan. Silakan gunakan chat.";
